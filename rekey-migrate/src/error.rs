//! Migration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for a single document transform.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors raised while transforming one configuration document. All of
/// them are recoverable at the file boundary.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration document: {0}")]
    Parse(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] rekey_crypto::CryptoError),

    #[error("unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tenant listing failed.
#[derive(Debug, Error)]
#[error("tenant enumeration failed: {0}")]
pub struct EnumerationError(pub String);

/// Fatal migration errors. Everything else is logged and skipped.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("error while getting tenants for migration: {0}")]
    Enumeration(#[from] EnumerationError),
}

/// Errors loading the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
