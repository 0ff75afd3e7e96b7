//! Location of userstore configuration files.

use crate::tenant::TenantScope;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves and lists the configuration directory of a tenant scope.
pub trait ConfigStore {
    /// Directory holding the scope's userstore configurations. Pure path
    /// computation; the directory may not exist.
    fn config_directory(&self, scope: &TenantScope) -> PathBuf;

    /// Regular files in `dir`. A missing directory has no files.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The product's on-disk layout under its home directory.
#[derive(Clone, Debug)]
pub struct CarbonLayout {
    carbon_home: PathBuf,
}

impl CarbonLayout {
    pub fn new(carbon_home: impl Into<PathBuf>) -> Self {
        Self {
            carbon_home: carbon_home.into(),
        }
    }

    pub fn carbon_home(&self) -> &Path {
        &self.carbon_home
    }
}

impl ConfigStore for CarbonLayout {
    fn config_directory(&self, scope: &TenantScope) -> PathBuf {
        let repository = self.carbon_home.join("repository");
        match scope {
            TenantScope::Super => repository.join("deployment").join("server").join("userstores"),
            TenantScope::Tenant(tenant) => repository
                .join("tenants")
                .join(tenant.id.to_string())
                .join("userstores"),
        }
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::Tenant;
    use tempfile::TempDir;

    #[test]
    fn computes_directories() {
        let layout = CarbonLayout::new("/opt/is");
        assert_eq!(
            layout.config_directory(&TenantScope::Super),
            PathBuf::from("/opt/is/repository/deployment/server/userstores")
        );
        assert_eq!(
            layout.config_directory(&TenantScope::Tenant(Tenant::new(5, "x.com"))),
            PathBuf::from("/opt/is/repository/tenants/5/userstores")
        );
    }

    #[test]
    fn lists_only_regular_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.xml"), "<a/>").unwrap();
        fs::write(dir.path().join("a.xml"), "<a/>").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = CarbonLayout::new(dir.path()).list_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.xml"), dir.path().join("b.xml")]);
    }

    #[test]
    fn missing_directory_has_no_files() {
        let dir = TempDir::new().unwrap();
        let files = CarbonLayout::new(dir.path())
            .list_files(&dir.path().join("absent"))
            .unwrap();
        assert!(files.is_empty());
    }
}
