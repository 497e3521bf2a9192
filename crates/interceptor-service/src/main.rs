//! # Interceptor Service
//!
//! Binary entry point for the GitHub hook interceptor.
//!
//! This executable:
//! - Parses command line flags
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Registers the pull-request and push interceptors
//! - Starts the HTTP server from interceptor-api

mod cli;

use clap::Parser;
use cli::Args;
use interceptor_api::{load_config, start_server, LoggingConfig};
use interceptor_core::EventRouter;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order, later sources override earlier ones):
    //  1. ./config/interceptor.yaml
    //  2. --config / INTERCEPTOR_CONFIG_FILE
    //  3. Environment variables prefixed INTERCEPTOR__ (double-underscore separator)
    //     e.g. INTERCEPTOR__SERVER__PORT=9090 sets server.port = 9090
    //  4. --port / INTERCEPTOR_PORT
    // -------------------------------------------------------------------------
    let loaded = load_config(args.config.as_deref());

    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration; aborting");
            std::process::exit(3);
        }
    };
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        push_commit_fallback = ?config.interception.push_commit_fallback,
        "Starting interceptor"
    );

    let router = EventRouter::github(&config.interception.options());

    if let Err(e) = start_server(config, router).await {
        error!(error = %e, "Server terminated with an error");
        std::process::exit(e.exit_code());
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = logging.level.to_ascii_lowercase();
        format!(
            "interceptor={level},interceptor_api={level},interceptor_core={level},tower_http={level}"
        )
        .into()
    });

    let (json_layer, text_layer) = if logging.json_format {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
