//! Failures reading a configuration file from disk
//!
//! Shared by every crate that loads TOML overrides. Validation of the
//! values themselves is reported by the loading crate, wrapping this type.

use thiserror::Error;

/// File access and TOML syntax errors, before any value is validated
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
