//! Command line arguments.

use clap::Parser;
use interceptor_api::ServiceConfig;

/// Pre-filter GitHub hook deliveries for trigger pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "interceptor", version, about)]
pub struct Args {
    /// The port number the HTTP service listens on.
    #[arg(short, long, env = "INTERCEPTOR_PORT")]
    pub port: Option<u16>,

    /// Path to a YAML configuration file.
    #[arg(short, long, env = "INTERCEPTOR_CONFIG_FILE")]
    pub config: Option<String>,
}

impl Args {
    /// Apply command line values on top of file and environment configuration.
    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
