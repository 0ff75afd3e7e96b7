//! Tenants and tenant enumeration.

use crate::error::EnumerationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Sentinel id of the super tenant.
pub const SUPER_TENANT_ID: i32 = -1234;

/// Domain of the super tenant.
pub const SUPER_TENANT_DOMAIN: &str = "carbon.super";

/// A regular tenant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i32,
    pub domain: String,
}

impl Tenant {
    pub fn new(id: i32, domain: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
        }
    }
}

/// Scope a configuration directory belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TenantScope {
    Super,
    Tenant(Tenant),
}

impl TenantScope {
    pub fn id(&self) -> i32 {
        match self {
            TenantScope::Super => SUPER_TENANT_ID,
            TenantScope::Tenant(tenant) => tenant.id,
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            TenantScope::Super => SUPER_TENANT_DOMAIN,
            TenantScope::Tenant(tenant) => &tenant.domain,
        }
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.domain(), self.id())
    }
}

/// Source of the tenants to migrate.
pub trait TenantRegistry {
    fn list_tenants(&self) -> Result<HashSet<Tenant>, EnumerationError>;
}

/// A fixed tenant list, e.g. from the run configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticTenantRegistry {
    tenants: Vec<Tenant>,
}

impl StaticTenantRegistry {
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self { tenants }
    }
}

impl TenantRegistry for StaticTenantRegistry {
    fn list_tenants(&self) -> Result<HashSet<Tenant>, EnumerationError> {
        Ok(self.tenants.iter().cloned().collect())
    }
}

/// Discovers tenants from the numeric directory names under
/// `<home>/repository/tenants`. The directory carries no domain, so the id
/// doubles as the domain.
#[derive(Clone, Debug)]
pub struct TenantDirectoryScan {
    tenants_root: PathBuf,
}

impl TenantDirectoryScan {
    pub fn new(carbon_home: impl Into<PathBuf>) -> Self {
        Self {
            tenants_root: carbon_home.into().join("repository").join("tenants"),
        }
    }
}

impl TenantRegistry for TenantDirectoryScan {
    fn list_tenants(&self) -> Result<HashSet<Tenant>, EnumerationError> {
        if !self.tenants_root.exists() {
            return Ok(HashSet::new());
        }
        let entries = fs::read_dir(&self.tenants_root).map_err(|e| {
            EnumerationError(format!("unable to list {}: {e}", self.tenants_root.display()))
        })?;

        let mut tenants = HashSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| EnumerationError(e.to_string()))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Ok(id) = name.parse::<i32>() {
                if id > 0 {
                    tenants.insert(Tenant::new(id, name));
                }
            }
        }
        Ok(tenants)
    }
}
