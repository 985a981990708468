//! Common error types for help desk components.

use thiserror::Error;

/// Errors raised while setting up shared infrastructure.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Tracing subscriber could not be installed (usually already installed).
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias using `CommonError`
pub type Result<T> = std::result::Result<T, CommonError>;
