//! Shared fixtures: a throwaway product home with a PEM keystore.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rekey_crypto::{AsymmetricCipher, FixedTransformation, KeyAliases, PemKeystore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const CERT_PEM: &str = include_str!("../../../rekey-crypto/tests/fixtures/wso2carbon.crt.pem");
const KEY_PEM: &str = include_str!("../../../rekey-crypto/tests/fixtures/wso2carbon.key.pem");

/// "admin-password" encrypted by OpenSSL with PKCS#1 v1.5 padding.
pub const OPENSSL_PKCS1_B64: &str = include_str!("../../../rekey-crypto/tests/fixtures/legacy-pkcs1.b64");

pub const ALIAS: &str = "wso2carbon";
pub const KEY_PASSWORD: &str = "wso2carbon";
pub const OAEP_SHA1: &str = "RSA/ECB/OAEPwithSHA1andMGF1Padding";
pub const OAEP_SHA256: &str = "RSA/ECB/OAEPwithSHA256andMGF1Padding";

pub struct CarbonHome {
    dir: TempDir,
}

impl CarbonHome {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let security = dir.path().join("repository/resources/security");
        fs::create_dir_all(security.join("internal")).unwrap();
        fs::create_dir_all(security.join("primary")).unwrap();
        fs::write(security.join("internal").join(format!("{ALIAS}.crt.pem")), CERT_PEM).unwrap();
        fs::write(security.join("primary").join(format!("{ALIAS}.key.pem")), KEY_PEM).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn keystore_root(&self) -> PathBuf {
        self.path().join("repository/resources/security")
    }

    pub fn super_dir(&self) -> PathBuf {
        self.path().join("repository/deployment/server/userstores")
    }

    pub fn tenant_dir(&self, id: i32) -> PathBuf {
        self.path().join("repository/tenants").join(id.to_string()).join("userstores")
    }

    /// Cipher over the home's keystore with `configured` as the process
    /// transformation.
    pub fn cipher(&self, configured: Option<&str>) -> Arc<AsymmetricCipher> {
        Arc::new(AsymmetricCipher::new(
            Arc::new(PemKeystore::new(self.keystore_root())),
            KeyAliases::new(ALIAS, KEY_PASSWORD, ALIAS),
            Arc::new(FixedTransformation(configured.map(str::to_string))),
        ))
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Bare base64 ciphertext as written before envelopes existed.
pub fn legacy_value(cipher: &AsymmetricCipher, plaintext: &str) -> String {
    STANDARD.encode(cipher.encrypt(plaintext.as_bytes(), None, false).unwrap())
}

/// An LDAP userstore configuration with `value` as its bind password.
pub fn ldap_userstore(value: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<UserStoreManager class="org.wso2.carbon.user.core.ldap.UniqueIDReadWriteLDAPUserStoreManager">
    <Property name="ConnectionURL">ldap://localhost:10389</Property>
    <Property name="ConnectionName">uid=admin,ou=system</Property>
    <Property encrypted="true" name="ConnectionPassword">{value}</Property>
    <Property name="UserSearchBase">ou=Users,dc=wso2,dc=org</Property>
    <Property name="DomainName">LDAP1</Property>
</UserStoreManager>
"#
    )
}

/// Text content of the first `ConnectionPassword` property.
pub fn connection_password(xml: &str) -> String {
    let start = xml.find(r#"name="ConnectionPassword">"#).unwrap() + r#"name="ConnectionPassword">"#.len();
    let end = start + xml[start..].find("</Property>").unwrap();
    xml[start..end].to_string()
}

pub const RAW: &str = "RSA/NONE/NoPadding";
pub const PKCS1: &str = "RSA/ECB/PKCS1Padding";

/// Single-property userstore document; `value` is not RSA-padded data.
pub const MINIMAL_USERSTORE: &str =
    r#"<UserStoreManager><Property name="ConnectionPassword" encrypted="true">QmFzZTY0VGV4dA==</Property></UserStoreManager>"#;
