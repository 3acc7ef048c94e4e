//! Common error types for speakr

use thiserror::Error;

/// Common result type for speakr operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across speakr crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
