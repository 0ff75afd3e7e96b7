//! Cipher transformation names.
//!
//! Transformations use the `ALG/MODE/PADDING` form the keystore platform
//! writes into its configuration, e.g. `RSA/ECB/OAEPwithSHA1andMGF1Padding`.
//! Matching is case-insensitive; the mode segment is accepted but has no
//! effect on a single-block RSA operation.
//!
//! The bare `RSA` name is raw (unpadded) RSA, as the platform's security
//! provider resolves it. PKCS#1 v1.5 has to be requested by its full name.

use crate::error::{CryptoError, CryptoResult};
use rand::rngs::OsRng;
use rsa::hazmat::{rsa_decrypt_and_check, rsa_encrypt};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

/// Transformation used when the caller does not name one.
pub const DEFAULT_TRANSFORMATION: &str = "RSA";

/// Padding scheme selected by a transformation name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Padding {
    /// No padding: the plaintext is the RSA integer itself.
    Raw,
    /// PKCS#1 v1.5 encryption padding.
    Pkcs1v15,
    /// OAEP with SHA-1 and MGF1-SHA-1.
    OaepSha1,
    /// OAEP with SHA-256 and MGF1-SHA-256.
    OaepSha256,
}

/// A parsed transformation, keeping the name exactly as it was requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transformation {
    name: String,
    padding: Padding,
}

impl Transformation {
    /// Parses a transformation name.
    pub fn parse(name: &str) -> CryptoResult<Self> {
        let unsupported = || CryptoError::UnsupportedTransformation(name.to_string());
        let segments: Vec<&str> = name.trim().split('/').map(str::trim).collect();

        let padding = match segments.as_slice() {
            [alg] if alg.eq_ignore_ascii_case("RSA") => Padding::Raw,
            [alg, mode, padding] if alg.eq_ignore_ascii_case("RSA") => {
                if !(mode.eq_ignore_ascii_case("ECB") || mode.eq_ignore_ascii_case("NONE")) {
                    return Err(unsupported());
                }
                parse_padding(padding).ok_or_else(unsupported)?
            }
            _ => return Err(unsupported()),
        };

        Ok(Self {
            name: name.to_string(),
            padding,
        })
    }

    /// The implicit default (`RSA`, PKCS#1 v1.5).
    pub fn implicit_default() -> Self {
        Self {
            name: DEFAULT_TRANSFORMATION.to_string(),
            padding: Padding::Raw,
        }
    }

    /// The name as supplied by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Encrypts one block with the public key.
    pub(crate) fn encrypt(&self, key: &RsaPublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut rng = OsRng;
        let result = match self.padding {
            Padding::Raw => raw_encrypt(key, plaintext),
            Padding::Pkcs1v15 => key.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext),
            Padding::OaepSha1 => key.encrypt(&mut rng, Oaep::new::<Sha1>(), plaintext),
            Padding::OaepSha256 => key.encrypt(&mut rng, Oaep::new::<Sha256>(), plaintext),
        };
        result.map_err(|e| CryptoError::Encryption(format!("{} ({}): {e}", self.name, plaintext.len())))
    }

    /// Decrypts one block with the private key.
    pub(crate) fn decrypt(&self, key: &RsaPrivateKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let result = match self.padding {
            Padding::Raw => raw_decrypt(key, ciphertext),
            Padding::Pkcs1v15 => key.decrypt(Pkcs1v15Encrypt, ciphertext),
            Padding::OaepSha1 => key.decrypt(Oaep::new::<Sha1>(), ciphertext),
            Padding::OaepSha256 => key.decrypt(Oaep::new::<Sha256>(), ciphertext),
        };
        result.map_err(|e| CryptoError::Decryption(format!("{}: {e}", self.name)))
    }
}

/// `m^e mod n`, left-padded to the modulus size.
fn raw_encrypt(key: &RsaPublicKey, plaintext: &[u8]) -> rsa::Result<Vec<u8>> {
    let size = key.size();
    if plaintext.len() > size {
        return Err(rsa::Error::MessageTooLong);
    }
    let m = BigUint::from_bytes_be(plaintext);
    if &m >= key.n() {
        return Err(rsa::Error::MessageTooLong);
    }
    let c = rsa_encrypt(key, &m)?.to_bytes_be();
    let mut out = vec![0u8; size.saturating_sub(c.len())];
    out.extend_from_slice(&c);
    Ok(out)
}

/// `c^d mod n` as a minimal big-endian integer; zero decrypts to nothing.
fn raw_decrypt(key: &RsaPrivateKey, ciphertext: &[u8]) -> rsa::Result<Vec<u8>> {
    if ciphertext.len() > key.size() {
        return Err(rsa::Error::Decryption);
    }
    let c = BigUint::from_bytes_be(ciphertext);
    let m = rsa_decrypt_and_check(key, Some(&mut OsRng), &c)?;
    let bytes = m.to_bytes_be();
    Ok(match bytes.iter().position(|b| *b != 0) {
        Some(start) => bytes[start..].to_vec(),
        None => Vec::new(),
    })
}

fn parse_padding(padding: &str) -> Option<Padding> {
    let normalized = padding.to_ascii_uppercase().replace('-', "");
    match normalized.as_str() {
        "NOPADDING" => Some(Padding::Raw),
        "PKCS1PADDING" => Some(Padding::Pkcs1v15),
        "OAEPPADDING" | "OAEPWITHSHA1ANDMGF1PADDING" => Some(Padding::OaepSha1),
        "OAEPWITHSHA256ANDMGF1PADDING" => Some(Padding::OaepSha256),
        _ => None,
    }
}
