//! Package identity (`category/name-version[-rN]`) splitting

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::IdentityError;
use crate::package::version::Version;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+_][A-Za-z0-9+_.-]*$").expect("name regex is valid"));

static REVISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^r\d+$").expect("revision regex is valid"));

/// A fully qualified package version: `cp`, version and revision
#[derive(Debug, Clone)]
pub struct PackageIdentity {
    cp: String,
    version: Version,
    revision: String,
}

impl PackageIdentity {
    /// Split a `category/name-version[-rN]` string.
    ///
    /// The revision defaults to `r0` when absent.
    pub fn parse(cpv: &str) -> Result<Self, IdentityError> {
        let Some((category, rest)) = cpv.split_once('/') else {
            return Err(IdentityError::MissingCategory(cpv.to_string()));
        };
        if category.is_empty() || !NAME_RE.is_match(category) {
            return Err(IdentityError::MissingCategory(cpv.to_string()));
        }

        let mut parts: Vec<&str> = rest.split('-').collect();
        let revision = match parts.last() {
            Some(last) if parts.len() > 2 && REVISION_RE.is_match(last) => {
                let rev = last.to_string();
                parts.pop();
                rev
            }
            _ => "r0".to_string(),
        };

        if parts.len() < 2 {
            return Err(IdentityError::InvalidVersion(cpv.to_string()));
        }

        let version_str = parts.pop().unwrap_or_default();
        let version = Version::parse(version_str)
            .ok_or_else(|| IdentityError::InvalidVersion(cpv.to_string()))?;

        let name = parts.join("-");
        if !NAME_RE.is_match(&name) {
            return Err(IdentityError::InvalidName(cpv.to_string()));
        }

        Ok(Self {
            cp: format!("{}/{}", category, name),
            version,
            revision,
        })
    }

    /// Category and package name without version
    pub fn cp(&self) -> &str {
        &self.cp
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Revision string, `r0` when none was declared
    pub fn revision(&self) -> &str {
        &self.revision
    }

    fn revision_number(&self) -> u64 {
        self.revision[1..].parse().unwrap_or(0)
    }

    /// Package name without category
    pub fn name(&self) -> &str {
        self.cp.split_once('/').map(|(_, n)| n).unwrap_or(&self.cp)
    }

    /// The full `category/name-version[-rN]` string
    pub fn cpv(&self) -> String {
        if self.revision == "r0" {
            format!("{}-{}", self.cp, self.version)
        } else {
            format!("{}-{}-{}", self.cp, self.version, self.revision)
        }
    }
}

impl Ord for PackageIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cp
            .cmp(&other.cp)
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.revision_number().cmp(&other.revision_number()))
    }
}

impl PartialOrd for PackageIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageIdentity {}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cpv())
    }
}
