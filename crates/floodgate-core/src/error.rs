//! Error types for Floodgate

use std::time::Duration;

use thiserror::Error;

/// Core error type for pool operations
#[derive(Error, Debug)]
pub enum FloodgateError {
    #[error("Could not find {0} key inside of the property source")]
    MissingProperty(String),

    #[error("Invalid value {value:?} for {key} (expected {expected})")]
    InvalidProperty {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Pool is not initialized. Call initialize() first")]
    NotInitialized,

    #[error("Backend unavailable: {0}")]
    Backend(String),

    #[error("Timed out waiting for a session (timeout: {0:?})")]
    AcquireTimeout(Duration),

    #[error("Pool is shut down")]
    PoolClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, FloodgateError>;
