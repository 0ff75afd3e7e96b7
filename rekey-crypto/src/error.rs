//! Error types for keystore access and cipher operations.

use thiserror::Error;

/// Result type for keystore lookups.
pub type KeystoreResult<T> = Result<T, KeystoreError>;

/// Result type for cipher operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised while resolving certificates or private keys.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("no entry for alias '{0}'")]
    AliasNotFound(String),

    #[error("certificate chain for alias '{0}' is empty")]
    EmptyChain(String),

    #[error("unable to unlock private key for alias '{alias}': {reason}")]
    Unlock { alias: String, reason: String },

    #[error("malformed key material: {0}")]
    Malformed(String),

    #[error("keystore IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while encrypting, decrypting or classifying
/// ciphertext.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("keystore error: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("unsupported cipher transformation: {0}")]
    UnsupportedTransformation(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("envelope encoding failed: {0}")]
    Envelope(String),
}
