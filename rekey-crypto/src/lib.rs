//! Asymmetric encryption layer for userstore secrets.
//!
//! Provides:
//! - RSA encryption with the internal keystore's certificate and decryption
//!   with the primary keystore's private key
//! - Self-contained cipher envelopes that record the transformation and the
//!   certificate thumbprint next to the ciphertext
//! - A PEM directory keystore
//!
//! # Ciphertext forms
//!
//! 1. **Bare ciphertext**: the output of the default (`RSA`) transformation.
//!    It carries no metadata and can only be decrypted with the
//!    transformation it was written with.
//!
//! 2. **Self-contained ciphertext**: produced whenever a transformation is
//!    configured explicitly. The transformation travels with the data, so
//!    changing the configured transformation later does not strand values
//!    written earlier.

mod certificate;
pub mod cipher;
pub mod envelope;
mod error;
pub mod keystore;
mod transformation;

pub use certificate::{Certificate, THUMBPRINT_ALGORITHM};
pub use cipher::{AsymmetricCipher, EnvTransformation, FixedTransformation, KeyAliases, TransformationSource};
pub use envelope::CipherEnvelope;
pub use error::{CryptoError, CryptoResult, KeystoreError, KeystoreResult};
pub use keystore::{Keystore, PemKeystore};
pub use transformation::{Padding, Transformation, DEFAULT_TRANSFORMATION};
