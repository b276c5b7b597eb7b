//! JSON file backed package index
//!
//! ```json
//! {
//!   "packages": [
//!     {
//!       "cpv": "app-misc/foo-1.0",
//!       "repository": "gentoo",
//!       "ebuild": "/var/db/repos/gentoo/app-misc/foo/foo-1.0.ebuild",
//!       "environment": { "SRC_URI": "https://example.org/foo-1.0.tar.gz" }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::QueryError;
use crate::package::identity::PackageIdentity;
use crate::package::query::{PackageQuery, PackageRecord};

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    packages: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    cpv: String,
    #[serde(default = "default_repository")]
    repository: String,
    #[serde(default)]
    ebuild: Option<PathBuf>,
    #[serde(default)]
    environment: HashMap<String, String>,
}

fn default_repository() -> String {
    "gentoo".to_string()
}

/// Package index read from a JSON file
pub struct PackageIndex {
    path: PathBuf,
    records: RwLock<Vec<PackageRecord>>,
}

impl PackageIndex {
    /// Load the index at `path`
    pub fn load(path: &Path) -> Result<Self, QueryError> {
        let records = Self::read_records(path)?;
        info!("Loaded {} packages from {:?}", records.len(), path);

        Ok(Self {
            path: path.to_path_buf(),
            records: RwLock::new(records),
        })
    }

    fn read_records(path: &Path) -> Result<Vec<PackageRecord>, QueryError> {
        let content = std::fs::read_to_string(path)?;
        let index: IndexFile = serde_json::from_str(&content)?;

        index
            .packages
            .into_iter()
            .map(|entry| {
                let identity = PackageIdentity::parse(&entry.cpv)?;
                Ok(PackageRecord::new(
                    identity,
                    entry.repository,
                    entry.ebuild,
                    entry.environment,
                ))
            })
            .collect()
    }

    fn records(&self) -> Result<RwLockReadGuard<'_, Vec<PackageRecord>>, QueryError> {
        self.records.read().map_err(|_| QueryError::LockPoisoned)
    }
}

impl PackageQuery for PackageIndex {
    fn find(&self, query: &str) -> Result<Vec<PackageRecord>, QueryError> {
        let records = self.records()?;

        let matches: Vec<_> = if let Some(cpv) = query.strip_prefix('=') {
            let wanted = PackageIdentity::parse(cpv)?;
            records
                .iter()
                .filter(|r| *r.identity() == wanted)
                .cloned()
                .collect()
        } else if query.contains('/') {
            records.iter().filter(|r| r.cp() == query).cloned().collect()
        } else {
            records
                .iter()
                .filter(|r| r.identity().name() == query)
                .cloned()
                .collect()
        };

        debug!("Query '{}' matched {} packages", query, matches.len());
        Ok(matches)
    }

    fn package_from_ebuild(&self, path: &Path) -> Result<Option<String>, QueryError> {
        if path.extension().and_then(|e| e.to_str()) != Some("ebuild") {
            return Ok(None);
        }

        let stem = path.file_stem().and_then(|s| s.to_str());
        let package_dir = path.parent();
        let name = package_dir
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str());
        let category = package_dir
            .and_then(|p| p.parent())
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str());

        let (Some(stem), Some(name), Some(category)) = (stem, name, category) else {
            warn!("Cannot derive package from {:?}", path);
            return Ok(None);
        };

        let cpv = format!("{}/{}", category, stem);
        match PackageIdentity::parse(&cpv) {
            Ok(identity) if identity.name() == name => Ok(Some(cpv)),
            Ok(_) => {
                warn!("{:?} does not belong to package directory '{}'", path, name);
                Ok(None)
            }
            Err(e) => {
                warn!("Cannot derive package from {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    fn refresh_index(&self) -> Result<(), QueryError> {
        let fresh = Self::read_records(&self.path)?;
        let mut records = self.records.write().map_err(|_| QueryError::LockPoisoned)?;
        info!("Reloaded package index: {} packages", fresh.len());
        *records = fresh;
        Ok(())
    }
}
