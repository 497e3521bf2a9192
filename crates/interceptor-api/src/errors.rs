//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use interceptor_core::InterceptionError;
use tracing::{error, info};

use crate::config::ConfigError;

/// Interception handler errors with HTTP status code mapping
///
/// - `412 Precondition Failed`: the delivery did not match the criteria in
///   its headers and the pipeline should stop
/// - `500 Internal Server Error`: the delivery could not be processed, for
///   example because the body is not valid JSON
///
/// Both are returned as plain text.
#[derive(Debug, thiserror::Error)]
pub enum InterceptionHandlerError {
    /// Matching or enrichment failed
    ///
    /// Maps to: `500 Internal Server Error`
    #[error("failed handling the event: {0}")]
    Processing(#[from] InterceptionError),

    /// The delivery did not match
    ///
    /// Maps to: `412 Precondition Failed`
    #[error("failed interception")]
    NotMatched,
}

impl InterceptionHandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotMatched => StatusCode::PRECONDITION_FAILED,
        }
    }
}

impl IntoResponse for InterceptionHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Processing(e) => error!(error = %e, "Failed handling the event"),
            Self::NotMatched => info!("Delivery did not match interception criteria"),
        }

        (status, self.to_string()).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
