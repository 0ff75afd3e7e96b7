//! Run configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! product defaults.

use crate::error::ConfigError;
use crate::layout::CarbonLayout;
use crate::migrator::Migrator;
use crate::tenant::{StaticTenantRegistry, Tenant, TenantDirectoryScan, TenantRegistry};
use crate::transformer::ConfigTransformer;
use rekey_crypto::{
    AsymmetricCipher, EnvTransformation, KeyAliases, PemKeystore, Transformation, DEFAULT_TRANSFORMATION,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable that carries the process-wide transformation.
pub const DEFAULT_TRANSFORMATION_VARIABLE: &str = "CIPHER_TRANSFORMATION";

/// Keystore location and credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// PEM keystore directory, relative to `carbon_home` unless absolute.
    pub location: PathBuf,
    pub primary_alias: String,
    pub primary_key_password: String,
    pub internal_alias: String,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            location: PathBuf::from("repository/resources/security"),
            primary_alias: "wso2carbon".to_string(),
            primary_key_password: "wso2carbon".to_string(),
            internal_alias: "wso2carbon".to_string(),
        }
    }
}

impl fmt::Debug for KeystoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreConfig")
            .field("location", &self.location)
            .field("primary_alias", &self.primary_alias)
            .field("primary_key_password", &"<redacted>")
            .field("internal_alias", &self.internal_alias)
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub carbon_home: PathBuf,
    pub keystore: KeystoreConfig,
    /// Environment variable read for the target transformation.
    pub transformation_variable: String,
    /// Transformation the existing values were written with.
    pub legacy_transformation: String,
    /// Tenants to migrate. When absent, tenant directories are scanned.
    pub tenants: Option<Vec<Tenant>>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            carbon_home: PathBuf::from("."),
            keystore: KeystoreConfig::default(),
            transformation_variable: DEFAULT_TRANSFORMATION_VARIABLE.to_string(),
            legacy_transformation: DEFAULT_TRANSFORMATION.to_string(),
            tenants: None,
        }
    }
}

impl MigrationConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Transformation::parse(&self.legacy_transformation)
            .map_err(|e| ConfigError::Invalid(format!("legacy_transformation: {e}")))?;

        if self.transformation_variable.trim().is_empty() {
            return Err(ConfigError::Invalid("transformation_variable must not be empty".into()));
        }
        if self.keystore.primary_alias.is_empty() || self.keystore.internal_alias.is_empty() {
            return Err(ConfigError::Invalid("keystore aliases must not be empty".into()));
        }
        if let Some(tenant) = self.tenants.iter().flatten().find(|tenant| tenant.id <= 0) {
            return Err(ConfigError::Invalid(format!(
                "tenant '{}' has invalid id {}",
                tenant.domain, tenant.id
            )));
        }
        Ok(())
    }

    /// Keystore directory resolved against `carbon_home`.
    pub fn keystore_root(&self) -> PathBuf {
        if self.keystore.location.is_absolute() {
            self.keystore.location.clone()
        } else {
            self.carbon_home.join(&self.keystore.location)
        }
    }

    pub fn build_cipher(&self) -> AsymmetricCipher {
        AsymmetricCipher::new(
            Arc::new(PemKeystore::new(self.keystore_root())),
            KeyAliases::new(
                self.keystore.primary_alias.clone(),
                self.keystore.primary_key_password.clone(),
                self.keystore.internal_alias.clone(),
            ),
            Arc::new(EnvTransformation::new(self.transformation_variable.clone())),
        )
    }

    pub fn tenant_registry(&self) -> Box<dyn TenantRegistry> {
        match &self.tenants {
            Some(tenants) => Box::new(StaticTenantRegistry::new(tenants.clone())),
            None => Box::new(TenantDirectoryScan::new(self.carbon_home.clone())),
        }
    }

    pub fn layout(&self) -> CarbonLayout {
        CarbonLayout::new(self.carbon_home.clone())
    }

    /// Wires the cipher, tenant registry and layout into a [`Migrator`].
    pub fn build_migrator(&self) -> Migrator {
        let transformer = ConfigTransformer::new(Arc::new(self.build_cipher()), self.legacy_transformation.clone());
        Migrator::new(transformer, self.tenant_registry(), Box::new(self.layout()))
    }
}
