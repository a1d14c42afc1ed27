//! Error types for clinic-core

use thiserror::Error;

/// Main error type for clinic-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Returned by `SessionStore` implementations that cannot read or write
    #[error("Session store error: {0}")]
    Store(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for clinic-core
pub type Result<T> = std::result::Result<T, Error>;
