//! Shared fixtures for cipher integration tests.

#![allow(dead_code)]

use pkcs8::DecodePrivateKey;
use rekey_crypto::{
    AsymmetricCipher, Certificate, FixedTransformation, KeyAliases, Keystore, KeystoreError,
    KeystoreResult,
};
use rsa::RsaPrivateKey;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const CERT_PEM: &str = include_str!("../fixtures/wso2carbon.crt.pem");
pub const KEY_PEM: &str = include_str!("../fixtures/wso2carbon.key.pem");
pub const OTHER_CERT_PEM: &str = include_str!("../fixtures/other.crt.pem");
pub const KEY_PASSWORD: &str = "wso2carbon";
pub const ALIAS: &str = "wso2carbon";
pub const THUMBPRINT: &str = "9a37bb78c969bf3db0fb2bc9880862f7f51763e1";

/// "admin-password" encrypted by OpenSSL with PKCS#1 v1.5 padding.
pub const OPENSSL_PKCS1_B64: &str = include_str!("../fixtures/legacy-pkcs1.b64");
/// "admin-password" encrypted by OpenSSL with OAEP SHA-1.
pub const OPENSSL_OAEP_SHA1_B64: &str = include_str!("../fixtures/oaep-sha1.b64");

pub const RAW: &str = "RSA/NONE/NoPadding";
pub const PKCS1: &str = "RSA/ECB/PKCS1Padding";
pub const OAEP_SHA1: &str = "RSA/ECB/OAEPwithSHA1andMGF1Padding";
pub const OAEP_SHA256: &str = "RSA/ECB/OAEPwithSHA256andMGF1Padding";

pub fn certificate() -> Certificate {
    Certificate::chain_from_pem(CERT_PEM.as_bytes())
        .expect("fixture certificate must parse")
        .remove(0)
}

/// In-memory keystore over the fixture key pair that counts lookups.
pub struct MemoryKeystore {
    chain: Vec<Certificate>,
    key: RsaPrivateKey,
    pub chain_lookups: AtomicUsize,
    pub key_lookups: AtomicUsize,
}

impl MemoryKeystore {
    pub fn new() -> Self {
        Self {
            chain: vec![certificate()],
            key: RsaPrivateKey::from_pkcs8_encrypted_pem(KEY_PEM, KEY_PASSWORD)
                .expect("fixture key must unlock"),
            chain_lookups: AtomicUsize::new(0),
            key_lookups: AtomicUsize::new(0),
        }
    }
}

impl Keystore for MemoryKeystore {
    fn internal_certificate_chain(&self, alias: &str) -> KeystoreResult<Vec<Certificate>> {
        self.chain_lookups.fetch_add(1, Ordering::SeqCst);
        if alias != ALIAS {
            return Err(KeystoreError::AliasNotFound(alias.to_string()));
        }
        Ok(self.chain.clone())
    }

    fn primary_private_key(&self, alias: &str, passphrase: &str) -> KeystoreResult<RsaPrivateKey> {
        self.key_lookups.fetch_add(1, Ordering::SeqCst);
        if alias != ALIAS {
            return Err(KeystoreError::AliasNotFound(alias.to_string()));
        }
        if passphrase != KEY_PASSWORD {
            return Err(KeystoreError::Unlock {
                alias: alias.to_string(),
                reason: "bad passphrase".into(),
            });
        }
        Ok(self.key.clone())
    }
}

pub fn aliases() -> KeyAliases {
    KeyAliases::new(ALIAS, KEY_PASSWORD, ALIAS)
}

/// Cipher over the fixture key pair with `configured` as the process
/// transformation.
pub fn cipher_with(configured: Option<&str>) -> AsymmetricCipher {
    AsymmetricCipher::new(
        Arc::new(MemoryKeystore::new()),
        aliases(),
        Arc::new(FixedTransformation(configured.map(str::to_string))),
    )
}
