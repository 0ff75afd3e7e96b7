//! Self-contained cipher envelopes.
//!
//! An envelope carries the transformation and the encryption certificate's
//! thumbprint next to the ciphertext, so a value written today still
//! decrypts after the configured transformation changes. The serialized
//! form is a compact JSON object:
//!
//! ```text
//! {"c":"<base64 ciphertext>","t":"<transformation>","tp":"<thumbprint>","tpd":"SHA-1"}
//! ```
//!
//! Bare ciphertext is usually not valid JSON, which is how [`decode`] tells
//! the two apart. Decoding never fails; anything that is not an envelope
//! yields `None`.

use crate::certificate::{Certificate, THUMBPRINT_ALGORITHM};
use crate::error::{CryptoError, CryptoResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A ciphertext together with the metadata needed to decrypt it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherEnvelope {
    /// Raw asymmetric ciphertext.
    pub cipher_text: Vec<u8>,
    /// Transformation the ciphertext was produced with.
    pub transformation: String,
    /// Hex digest of the encryption certificate.
    pub thumbprint: String,
    /// Digest algorithm of `thumbprint`.
    pub thumbprint_algorithm: String,
}

/// Wire record. Field names match the platform's cipher holder.
#[derive(Serialize, Deserialize)]
struct EnvelopeRecord {
    #[serde(rename = "c")]
    cipher_text: String,
    #[serde(rename = "t")]
    transformation: String,
    #[serde(rename = "tp", default)]
    thumbprint: String,
    #[serde(rename = "tpd", default)]
    thumbprint_algorithm: String,
}

impl CipherEnvelope {
    /// Builds an envelope for ciphertext produced with `certificate`.
    pub fn new(cipher_text: Vec<u8>, transformation: &str, certificate: &Certificate) -> Self {
        Self {
            cipher_text,
            transformation: transformation.to_string(),
            thumbprint: certificate.thumbprint(),
            thumbprint_algorithm: THUMBPRINT_ALGORITHM.to_string(),
        }
    }

    /// Serializes the envelope.
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        let record = EnvelopeRecord {
            cipher_text: STANDARD.encode(&self.cipher_text),
            transformation: self.transformation.clone(),
            thumbprint: self.thumbprint.clone(),
            thumbprint_algorithm: self.thumbprint_algorithm.clone(),
        };
        serde_json::to_vec(&record).map_err(|e| CryptoError::Envelope(e.to_string()))
    }
}

/// Wraps `cipher_text` into serialized envelope bytes.
pub fn encode(cipher_text: &[u8], transformation: &str, certificate: &Certificate) -> CryptoResult<Vec<u8>> {
    CipherEnvelope::new(cipher_text.to_vec(), transformation, certificate).to_bytes()
}

/// Parses envelope bytes. Returns `None` for anything that is not an
/// envelope, including empty input and arbitrary binary data.
pub fn decode(bytes: &[u8]) -> Option<CipherEnvelope> {
    let record: EnvelopeRecord = match serde_json::from_slice(bytes) {
        Ok(record) => record,
        Err(_) => {
            debug!("ciphertext is not a self-contained envelope");
            return None;
        }
    };
    let cipher_text = match STANDARD.decode(record.cipher_text.as_bytes()) {
        Ok(cipher_text) => cipher_text,
        Err(_) => {
            debug!("envelope cipher text is not base64; treating value as bare ciphertext");
            return None;
        }
    };

    Some(CipherEnvelope {
        cipher_text,
        transformation: record.transformation,
        thumbprint: record.thumbprint,
        thumbprint_algorithm: record.thumbprint_algorithm,
    })
}

/// Whether `bytes` is a serialized envelope.
pub fn is_self_contained(bytes: &[u8]) -> bool {
    decode(bytes).is_some()
}
