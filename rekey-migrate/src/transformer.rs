//! Re-encrypts the secret fields of one configuration file.

use crate::document::ConfigDocument;
use crate::error::{TransformError, TransformResult};
use rekey_crypto::{AsymmetricCipher, CryptoResult};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Rewrites userstore configuration files with re-encrypted secrets.
pub struct ConfigTransformer {
    cipher: Arc<AsymmetricCipher>,
    legacy_transformation: String,
}

impl ConfigTransformer {
    /// `legacy_transformation` decrypts values that are not yet
    /// self-contained.
    pub fn new(cipher: Arc<AsymmetricCipher>, legacy_transformation: impl Into<String>) -> Self {
        Self {
            cipher,
            legacy_transformation: legacy_transformation.into(),
        }
    }

    pub fn cipher(&self) -> &AsymmetricCipher {
        &self.cipher
    }

    /// Re-encrypts every eligible field of the document at `path`.
    ///
    /// Returns `true` when the file was written back, which happens whenever
    /// it has at least one eligible field. Fields that keep their value are
    /// written verbatim, so a rewrite without new values is byte-identical.
    pub fn transform(&self, path: &Path) -> TransformResult<bool> {
        info!("migrating password in: {}", path.display());

        let source = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::InvalidData => TransformError::Parse(format!("{}: {source}", path.display())),
            _ => TransformError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let mut document = ConfigDocument::parse(source)?;

        let mut eligible = 0;
        let mut updates = Vec::new();
        for (index, field) in document.eligible_fields() {
            eligible += 1;
            if let Some(value) = self.reencrypt(&field.raw_value)? {
                debug!("new value for {} '{}'", field.element_name, field.name.as_str());
                updates.push((index, value));
            }
        }
        if eligible == 0 {
            debug!("no encrypted secrets in {}", path.display());
            return Ok(false);
        }
        for (index, value) in updates {
            document.set_text(index, value);
        }
        if !document.is_modified() {
            debug!("field values unchanged, rewriting {} as is", path.display());
        }

        fs::write(path, document.render()).map_err(|source| TransformError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("updated {}", path.display());
        Ok(true)
    }

    /// Computes the value written back for one base64 ciphertext.
    ///
    /// Empty values have no replacement. Self-contained values are returned
    /// as they are. Anything else is decrypted with the legacy
    /// transformation and encrypted with the configured one.
    pub fn reencrypt(&self, encrypted: &str) -> CryptoResult<Option<String>> {
        let value = encrypted.trim();
        if value.is_empty() {
            return Ok(None);
        }
        if self.cipher.is_self_contained_base64(value)? {
            debug!("value is already self-contained, keeping it");
            return Ok(Some(encrypted.to_string()));
        }

        let plaintext = Zeroizing::new(
            self.cipher
                .decrypt_base64_as(value, Some(&self.legacy_transformation))?,
        );
        let reencrypted = self.cipher.encrypt_to_base64(&plaintext)?;
        Ok(Some(reencrypted).filter(|value| !value.is_empty()))
    }
}
