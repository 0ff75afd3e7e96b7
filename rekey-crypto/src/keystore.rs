//! Keystore capability.
//!
//! The cipher service never reads key material itself; it asks a
//! [`Keystore`] for the encryption certificate chain ("internal" keystore)
//! and for the decryption private key ("primary" keystore).
//! [`PemKeystore`] is the file-backed implementation used by the CLI.

use crate::certificate::Certificate;
use crate::error::{KeystoreError, KeystoreResult};
use pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of certificates and private keys, looked up by alias.
pub trait Keystore: Send + Sync {
    /// Certificate chain of the encryption key, leaf first.
    fn internal_certificate_chain(&self, alias: &str) -> KeystoreResult<Vec<Certificate>>;

    /// Decryption key, unlocked with `passphrase`.
    fn primary_private_key(&self, alias: &str, passphrase: &str) -> KeystoreResult<RsaPrivateKey>;
}

/// Keystore backed by a directory of PEM files:
///
/// ```text
/// <root>/internal/<alias>.crt.pem   certificate chain, leaf first
/// <root>/primary/<alias>.key.pem    PKCS#8 private key, optionally encrypted
/// ```
#[derive(Clone, Debug)]
pub struct PemKeystore {
    root: PathBuf,
}

impl PemKeystore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn certificate_path(&self, alias: &str) -> PathBuf {
        self.root.join("internal").join(format!("{alias}.crt.pem"))
    }

    fn key_path(&self, alias: &str) -> PathBuf {
        self.root.join("primary").join(format!("{alias}.key.pem"))
    }
}

fn read_entry(path: &Path, alias: &str) -> KeystoreResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => KeystoreError::AliasNotFound(alias.to_string()),
        _ => KeystoreError::Io(e),
    })
}

impl Keystore for PemKeystore {
    fn internal_certificate_chain(&self, alias: &str) -> KeystoreResult<Vec<Certificate>> {
        let path = self.certificate_path(alias);
        debug!("loading certificate chain for '{alias}' from {}", path.display());
        let pem = read_entry(&path, alias)?;
        let chain = Certificate::chain_from_pem(pem.as_bytes())
            .map_err(|e| KeystoreError::Malformed(e.to_string()))?;
        if chain.is_empty() {
            return Err(KeystoreError::EmptyChain(alias.to_string()));
        }
        Ok(chain)
    }

    fn primary_private_key(&self, alias: &str, passphrase: &str) -> KeystoreResult<RsaPrivateKey> {
        let path = self.key_path(alias);
        debug!("loading private key for '{alias}' from {}", path.display());
        let pem = zeroize::Zeroizing::new(read_entry(&path, alias)?);

        if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
            RsaPrivateKey::from_pkcs8_encrypted_pem(pem.as_str(), passphrase).map_err(|e| KeystoreError::Unlock {
                alias: alias.to_string(),
                reason: e.to_string(),
            })
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem.as_str()).map_err(|e| KeystoreError::Malformed(e.to_string()))
        }
    }
}
