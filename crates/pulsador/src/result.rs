//! Result and error types for Pulsador.
//!
//! Errors are reserved for construction-time faults (bad configuration).
//! A poll that times out or a target that cannot be resolved is a normal
//! negative outcome, reported as `None` or a skip variant, never as an error.

use thiserror::Error;

/// Result type for Pulsador operations
pub type PulsadorResult<T> = Result<T, PulsadorError>;

/// Errors that can occur in Pulsador
#[derive(Debug, Error)]
pub enum PulsadorError {
    /// Identifier pattern could not be compiled
    #[error("Invalid identifier pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration rejected during validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
    },

    /// JSON error (configuration load)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
