//! Common error types for Tangshi

use thiserror::Error;

/// Common result type for Tangshi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across Tangshi crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Action is already in progress and does not accept overlapping requests
    #[error("Action busy: {0} is already in progress")]
    Busy(String),
}
