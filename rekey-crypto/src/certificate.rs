//! X.509 encryption certificates.

use crate::error::{CryptoError, CryptoResult};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use sha1::{Digest, Sha1};
use x509_parser::error::PEMError;
use x509_parser::pem::Pem;

/// Digest algorithm used for certificate thumbprints.
pub const THUMBPRINT_ALGORITHM: &str = "SHA-1";

/// A DER-encoded X.509 certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    /// Wraps DER bytes after checking they parse as a certificate.
    pub fn from_der(der: Vec<u8>) -> CryptoResult<Self> {
        x509_parser::parse_x509_certificate(&der)
            .map_err(|e| CryptoError::Certificate(format!("invalid DER certificate: {e}")))?;
        Ok(Self { der })
    }

    /// Reads every `CERTIFICATE` block of a PEM bundle, in file order.
    pub fn chain_from_pem(pem: &[u8]) -> CryptoResult<Vec<Self>> {
        let mut chain = Vec::new();
        for block in Pem::iter_from_buffer(pem) {
            let block = match block {
                Ok(block) => block,
                // trailing text after the last block
                Err(PEMError::MissingHeader) if !chain.is_empty() => break,
                Err(e) => return Err(CryptoError::Certificate(format!("invalid PEM: {e}"))),
            };
            if block.label == "CERTIFICATE" {
                chain.push(Self::from_der(block.contents)?);
            }
        }
        Ok(chain)
    }

    /// The canonical DER encoding.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Extracts the RSA subject public key.
    pub fn public_key(&self) -> CryptoResult<RsaPublicKey> {
        let (_, cert) = x509_parser::parse_x509_certificate(&self.der)
            .map_err(|e| CryptoError::Certificate(format!("invalid DER certificate: {e}")))?;
        RsaPublicKey::from_public_key_der(cert.public_key().raw)
            .map_err(|e| CryptoError::Certificate(format!("subject key is not RSA: {e}")))
    }

    /// Lowercase hex SHA-1 digest of the DER encoding.
    pub fn thumbprint(&self) -> String {
        hex::encode(Sha1::digest(&self.der))
    }
}
