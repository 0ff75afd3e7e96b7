//! Userstore password migration.
//!
//! Walks the secondary userstore configuration files of the super tenant
//! and every tenant, and re-encrypts each `password` / `ConnectionPassword`
//! field marked `encrypted="true"` with the configured cipher
//! transformation. Values already in self-contained form are left alone, so
//! a run can be repeated safely.
//!
//! A broken file or tenant is logged and skipped. Only a failure to list
//! the tenants aborts the run.

pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod migrator;
pub mod tenant;
pub mod transformer;

pub use config::{KeystoreConfig, MigrationConfig, DEFAULT_TRANSFORMATION_VARIABLE};
pub use document::{ConfigDocument, SecretField, SecretName};
pub use error::{ConfigError, EnumerationError, MigrationError, TransformError, TransformResult};
pub use layout::{CarbonLayout, ConfigStore};
pub use migrator::{FileFailure, MigrationReport, Migrator, TenantFailure};
pub use tenant::{
    StaticTenantRegistry, Tenant, TenantDirectoryScan, TenantRegistry, TenantScope, SUPER_TENANT_DOMAIN,
    SUPER_TENANT_ID,
};
pub use transformer::ConfigTransformer;

/// Environment variable that must be set for the tool to migrate anything.
pub const TRIGGER_VARIABLE: &str = "REKEY_MIGRATE";

/// Environment variable naming the configuration file.
pub const CONFIG_VARIABLE: &str = "REKEY_CONFIG";

/// Configuration file read when neither an argument nor
/// [`CONFIG_VARIABLE`] names one.
pub const DEFAULT_CONFIG_FILE: &str = "rekey.json";
