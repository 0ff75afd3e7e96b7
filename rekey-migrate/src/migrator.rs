//! Drives a migration run across the super tenant and every tenant.

use crate::error::MigrationError;
use crate::layout::ConfigStore;
use crate::tenant::{Tenant, TenantRegistry, TenantScope};
use crate::transformer::ConfigTransformer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// A file that could not be migrated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// A tenant whose configuration directory could not be processed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TenantFailure {
    pub tenant_id: i32,
    pub domain: String,
    pub error: String,
}

/// Outcome of a run.
#[derive(Clone, Debug, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Files written back because they hold encrypted secrets.
    pub migrated: Vec<PathBuf>,
    /// Files without encrypted secrets, left untouched.
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
    pub failed_tenants: Vec<TenantFailure>,
}

impl MigrationReport {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            migrated: Vec::new(),
            unchanged: Vec::new(),
            failed: Vec::new(),
            failed_tenants: Vec::new(),
        }
    }

    /// Whether every file and tenant was processed without error.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.failed_tenants.is_empty()
    }
}

/// Runs the super-tenant phase, then the tenant phase.
pub struct Migrator {
    transformer: ConfigTransformer,
    tenants: Box<dyn TenantRegistry>,
    store: Box<dyn ConfigStore>,
}

impl Migrator {
    pub fn new(
        transformer: ConfigTransformer,
        tenants: Box<dyn TenantRegistry>,
        store: Box<dyn ConfigStore>,
    ) -> Self {
        Self {
            transformer,
            tenants,
            store,
        }
    }

    /// Migrates every userstore configuration.
    ///
    /// Failures of single files or tenants are logged and recorded in the
    /// report. Only a failure to enumerate tenants aborts the run, after the
    /// super tenant has been processed.
    ///
    /// Tenants are migrated in ascending id order, whatever order the
    /// registry lists them in.
    pub fn migrate(&self) -> Result<MigrationReport, MigrationError> {
        info!("migration starting on secondary user stores");
        if self.transformer.cipher().configured_transformation().is_none() {
            warn!("no cipher transformation configured, values will be re-encrypted without an envelope");
        }

        let mut report = MigrationReport::start();

        if let Err(e) = self.migrate_scope(&TenantScope::Super, &mut report) {
            error!("error while updating secondary user store password for super tenant: {e}");
            report.failed_tenants.push(TenantFailure {
                tenant_id: TenantScope::Super.id(),
                domain: TenantScope::Super.domain().to_string(),
                error: e.to_string(),
            });
        }

        let tenants = match self.tenants.list_tenants() {
            Ok(tenants) => tenants,
            Err(e) => {
                error!("{e}");
                return Err(e.into());
            }
        };
        let mut tenants: Vec<Tenant> = tenants.into_iter().collect();
        tenants.sort_by_key(|tenant| tenant.id);

        for tenant in tenants {
            let scope = TenantScope::Tenant(tenant);
            if let Err(e) = self.migrate_scope(&scope, &mut report) {
                error!("error while updating secondary user store password for tenant {scope}: {e}");
                report.failed_tenants.push(TenantFailure {
                    tenant_id: scope.id(),
                    domain: scope.domain().to_string(),
                    error: e.to_string(),
                });
            }
        }

        let finished_at = Utc::now();
        report.finished_at = Some(finished_at);
        info!(
            elapsed_ms = (finished_at - report.started_at).num_milliseconds(),
            migrated = report.migrated.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            failed_tenants = report.failed_tenants.len(),
            "secondary user store password migration complete"
        );
        Ok(report)
    }

    fn migrate_scope(&self, scope: &TenantScope, report: &mut MigrationReport) -> io::Result<()> {
        let dir = self.store.config_directory(scope);
        info!("migrating userstores of {scope} in {}", dir.display());

        for file in self.store.list_files(&dir)? {
            match self.transformer.transform(&file) {
                Ok(true) => report.migrated.push(file),
                Ok(false) => report.unchanged.push(file),
                Err(e) => {
                    error!("error while updating password in {}: {e}", file.display());
                    report.failed.push(FileFailure {
                        path: file,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
