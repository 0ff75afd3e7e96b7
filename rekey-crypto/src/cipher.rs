//! Asymmetric cipher service.
//!
//! Encrypts with the public key of the internal keystore's certificate and
//! decrypts with the primary keystore's private key. When a transformation
//! is named explicitly, encryption can wrap the result into a
//! [`CipherEnvelope`](crate::envelope::CipherEnvelope) and decryption honours
//! envelopes it is handed.
//!
//! Decryption without a transformation hint does not look for envelopes;
//! callers that may hold self-contained ciphertext must pass a hint (which the
//! envelope then overrides).

use crate::certificate::Certificate;
use crate::envelope;
use crate::error::{CryptoResult, KeystoreError};
use crate::keystore::Keystore;
use crate::transformation::Transformation;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use zeroize::Zeroizing;

/// Provides the process-wide transformation name. Read on every call so
/// operators can change it between runs.
pub trait TransformationSource: Send + Sync {
    fn transformation(&self) -> Option<String>;
}

/// Reads the transformation from an environment variable. Unset or blank
/// means no transformation is configured.
#[derive(Clone, Debug)]
pub struct EnvTransformation {
    variable: String,
}

impl EnvTransformation {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl TransformationSource for EnvTransformation {
    fn transformation(&self) -> Option<String> {
        std::env::var(&self.variable)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// A transformation fixed at construction.
#[derive(Clone, Debug, Default)]
pub struct FixedTransformation(pub Option<String>);

impl TransformationSource for FixedTransformation {
    fn transformation(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Keystore aliases and the passphrase of the decryption key.
#[derive(Clone)]
pub struct KeyAliases {
    pub primary_alias: String,
    pub primary_key_password: Zeroizing<String>,
    pub internal_alias: String,
}

impl KeyAliases {
    pub fn new(
        primary_alias: impl Into<String>,
        primary_key_password: impl Into<String>,
        internal_alias: impl Into<String>,
    ) -> Self {
        Self {
            primary_alias: primary_alias.into(),
            primary_key_password: Zeroizing::new(primary_key_password.into()),
            internal_alias: internal_alias.into(),
        }
    }
}

struct EncryptionKey {
    certificate: Certificate,
    public_key: RsaPublicKey,
}

/// Public-key encryption and private-key decryption of short secrets.
///
/// Keystore entries are resolved on first use and cached for the lifetime of
/// the service.
pub struct AsymmetricCipher {
    keystore: Arc<dyn Keystore>,
    aliases: KeyAliases,
    transformation_source: Arc<dyn TransformationSource>,
    default_transformation: Transformation,
    encryption_key: OnceLock<EncryptionKey>,
    private_key: OnceLock<RsaPrivateKey>,
}

impl AsymmetricCipher {
    pub fn new(
        keystore: Arc<dyn Keystore>,
        aliases: KeyAliases,
        transformation_source: Arc<dyn TransformationSource>,
    ) -> Self {
        Self {
            keystore,
            aliases,
            transformation_source,
            default_transformation: Transformation::implicit_default(),
            encryption_key: OnceLock::new(),
            private_key: OnceLock::new(),
        }
    }

    /// Replaces the transformation used when a call names none.
    pub fn with_default_transformation(mut self, name: &str) -> CryptoResult<Self> {
        self.default_transformation = Transformation::parse(name)?;
        Ok(self)
    }

    /// The transformation currently configured for the process, if any.
    pub fn configured_transformation(&self) -> Option<String> {
        self.transformation_source.transformation()
    }

    fn encryption_key(&self) -> CryptoResult<&EncryptionKey> {
        if let Some(key) = self.encryption_key.get() {
            return Ok(key);
        }
        let alias = &self.aliases.internal_alias;
        let certificate = self
            .keystore
            .internal_certificate_chain(alias)?
            .into_iter()
            .next()
            .ok_or_else(|| KeystoreError::EmptyChain(alias.clone()))?;
        let public_key = certificate.public_key()?;
        Ok(self.encryption_key.get_or_init(|| EncryptionKey {
            certificate,
            public_key,
        }))
    }

    fn private_key(&self) -> CryptoResult<&RsaPrivateKey> {
        if let Some(key) = self.private_key.get() {
            return Ok(key);
        }
        let key = self
            .keystore
            .primary_private_key(&self.aliases.primary_alias, &self.aliases.primary_key_password)?;
        Ok(self.private_key.get_or_init(|| key))
    }

    /// Encrypts `plaintext`.
    ///
    /// With an explicit `transformation`, empty plaintext encrypts to empty
    /// output and `wrap` produces a serialized envelope. Without one, the
    /// default transformation is used and the raw ciphertext is returned.
    pub fn encrypt(&self, plaintext: &[u8], transformation: Option<&str>, wrap: bool) -> CryptoResult<Vec<u8>> {
        let key = self.encryption_key()?;

        let (cipher, cipher_transform_enabled) = match transformation {
            Some(name) => {
                debug!("cipher transformation for encryption: {name}");
                (Transformation::parse(name)?, true)
            }
            None => {
                debug!("default cipher transformation for encryption: {}", self.default_transformation.name());
                (self.default_transformation.clone(), false)
            }
        };

        if cipher_transform_enabled && plaintext.is_empty() {
            debug!("empty plaintext under {}, returning empty ciphertext", cipher.name());
            return Ok(Vec::new());
        }

        let cipher_text = cipher.encrypt(&key.public_key, plaintext)?;
        if cipher_transform_enabled && wrap {
            return envelope::encode(&cipher_text, cipher.name(), &key.certificate);
        }
        Ok(cipher_text)
    }

    /// Encrypts with the process-configured transformation, wrapped in an
    /// envelope when one is configured.
    pub fn encrypt_default(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let transformation = self.configured_transformation();
        self.encrypt(plaintext, transformation.as_deref(), true)
    }

    /// [`encrypt_default`](Self::encrypt_default), base64 encoded.
    pub fn encrypt_to_base64(&self, plaintext: &[u8]) -> CryptoResult<String> {
        Ok(STANDARD.encode(self.encrypt_default(plaintext)?))
    }

    /// Decrypts `ciphertext`.
    ///
    /// With a `transformation` hint, an envelope's embedded transformation
    /// and payload take precedence over the hint; bare ciphertext is
    /// decrypted with the hint. Without a hint the default transformation is
    /// applied to the bytes as given.
    pub fn decrypt(&self, ciphertext: &[u8], transformation: Option<&str>) -> CryptoResult<Vec<u8>> {
        let private_key = self.private_key()?;

        let (cipher, payload) = match transformation {
            Some(hint) => match envelope::decode(ciphertext) {
                Some(envelope) => {
                    debug!("cipher transformation for decryption: {}", envelope.transformation);
                    (Transformation::parse(&envelope.transformation)?, Cow::Owned(envelope.cipher_text))
                }
                None => {
                    debug!("cipher transformation for decryption: {hint}");
                    (Transformation::parse(hint)?, Cow::Borrowed(ciphertext))
                }
            },
            None => (self.default_transformation.clone(), Cow::Borrowed(ciphertext)),
        };

        if payload.is_empty() {
            debug!("empty ciphertext, returning empty plaintext");
            return Ok(Vec::new());
        }
        cipher.decrypt(private_key, &payload)
    }

    /// Base64-decodes and decrypts with the process-configured
    /// transformation as hint.
    pub fn decrypt_base64(&self, base64_ciphertext: &str) -> CryptoResult<Vec<u8>> {
        let transformation = self.configured_transformation();
        self.decrypt_base64_as(base64_ciphertext, transformation.as_deref())
    }

    /// Base64-decodes and decrypts with an explicit transformation hint.
    pub fn decrypt_base64_as(&self, base64_ciphertext: &str, transformation: Option<&str>) -> CryptoResult<Vec<u8>> {
        let ciphertext = decode_base64(base64_ciphertext)?;
        self.decrypt(&ciphertext, transformation)
    }

    pub fn is_self_contained(&self, ciphertext: &[u8]) -> bool {
        envelope::is_self_contained(ciphertext)
    }

    pub fn is_self_contained_base64(&self, base64_ciphertext: &str) -> CryptoResult<bool> {
        Ok(envelope::is_self_contained(&decode_base64(base64_ciphertext)?))
    }
}

/// Standard base64, tolerating line breaks and surrounding whitespace.
fn decode_base64(value: &str) -> CryptoResult<Vec<u8>> {
    let compact: String = value.split_ascii_whitespace().collect();
    Ok(STANDARD.decode(compact.as_bytes())?)
}
