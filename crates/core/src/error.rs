//! Error types for ov-core
//!
//! Every operation boundary in objview returns `Result<T>` with this error
//! type. Collision and cancellation conditions are distinguishable variants
//! so callers can give actionable guidance instead of a generic message.

use thiserror::Error;

/// Result type alias for ov-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ov-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid object key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Operation precondition failed (context mismatch, empty key or name)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Upload target already holds an object with this name
    #[error("A file named '{0}' already exists")]
    FileNameExists(String),

    /// Copy/move destination key already exists
    #[error("Destination already exists: {0}")]
    DestinationKeyExists(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Transfer cancelled by the user
    #[error("Transfer cancelled")]
    Cancelled,

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this is a name/key collision the user can resolve by
    /// renaming or opting into overwrite.
    pub const fn is_collision(&self) -> bool {
        matches!(
            self,
            Error::FileNameExists(_) | Error::DestinationKeyExists(_)
        )
    }

    /// Cancellation is a terminal outcome, not a failure to report.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Whether the operation failed before any backend call was made.
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Error::Precondition(_) | Error::InvalidKey(_))
    }
}

/// Re-wrap a failed `Result<A>` as a `Result<B>`, preserving the error.
///
/// Public API for embedding frontends that carry a typed failure across
/// their own result boundaries; inside this workspace the same conversion
/// is expressed with `?` on the shared error type.
///
/// Calling this on a success value is a caller bug: it is logged and
/// rejected with a precondition error rather than silently inventing a
/// failure.
pub fn carry_failure<A, B>(result: Result<A>) -> Result<B> {
    match result {
        Ok(_) => {
            tracing::warn!("carry_failure called on a success value");
            Err(Error::Precondition(
                "cannot re-wrap a success value as a failure".into(),
            ))
        }
        Err(e) => Err(e),
    }
}
