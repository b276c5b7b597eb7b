//! Package query trait and resolved package records

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;

use crate::error::QueryError;
use crate::package::identity::PackageIdentity;

/// A package version resolved by a [`PackageQuery`]
#[derive(Debug, Clone)]
pub struct PackageRecord {
    identity: PackageIdentity,
    repository: String,
    ebuild_path: Option<PathBuf>,
    environment: HashMap<String, String>,
}

impl PackageRecord {
    pub fn new(
        identity: PackageIdentity,
        repository: impl Into<String>,
        ebuild_path: Option<PathBuf>,
        environment: HashMap<String, String>,
    ) -> Self {
        Self {
            identity,
            repository: repository.into(),
            ebuild_path,
            environment,
        }
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn cp(&self) -> &str {
        self.identity.cp()
    }

    pub fn cpv(&self) -> String {
        self.identity.cpv()
    }

    pub fn version(&self) -> &str {
        self.identity.version().as_str()
    }

    /// Whether this record is a live/rolling build
    pub fn is_live(&self) -> bool {
        self.identity.version().is_live()
    }

    /// Value of a recipe environment variable, empty when unset
    pub fn environment(&self, key: &str) -> &str {
        self.environment.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn ebuild_path(&self) -> Option<&Path> {
        self.ebuild_path.as_deref()
    }

    pub fn repo_name(&self) -> &str {
        &self.repository
    }
}

impl Ord for PackageRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity.cmp(&other.identity)
    }
}

impl PartialOrd for PackageRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for PackageRecord {}

/// Trait for resolving user queries to package records
#[cfg_attr(test, automock)]
pub trait PackageQuery: Send + Sync {
    /// Find every package version matching a query (`cat/pkg`, `pkg` or `=cat/pkg-ver`)
    fn find(&self, query: &str) -> Result<Vec<PackageRecord>, QueryError>;

    /// Resolve a recipe file path to its `category/name-version` string
    fn package_from_ebuild(&self, path: &Path) -> Result<Option<String>, QueryError>;

    /// Reload the backing index so recently added recipes become visible
    fn refresh_index(&self) -> Result<(), QueryError>;
}
