//! Error types for configuration validation and loading

/// Errors from validating or loading a SMART configuration.
///
/// The built-in constants never produce these; they only surface when an
/// injected configuration breaks an invariant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },

    #[error("{field} must not have leading or trailing whitespace")]
    SurroundingWhitespace { field: &'static str },

    #[error("{field} is not a valid absolute URL ({value}): {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must use https, got scheme {scheme}")]
    InsecureScheme { field: &'static str, scheme: String },

    #[error("storage keys collide: {0}")]
    StorageKeyCollision(String),

    #[error(transparent)]
    Load(#[from] common::Error),
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;
