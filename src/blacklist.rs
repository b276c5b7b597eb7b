//! Package and version blacklists
//!
//! Whole packages are excluded before any scanning happens; version rules are
//! evaluated per candidate while filtering findings.

use std::collections::HashSet;

use crate::config::BlacklistConfig;
use crate::error::ConfigError;
use crate::package::identity::PackageIdentity;
use crate::package::version::Version;

/// Comparison operator of a version rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOp {
    Less,
    LessOrEqual,
    Equal,
    /// `=cat/pkg-1.0*`: any version starting with `1.0`
    EqualGlob,
    /// `~cat/pkg-1.0`: any revision of `1.0`
    AnyRevision,
    GreaterOrEqual,
    Greater,
}

/// A version rule such as `>=dev-lang/python-4.0`
#[derive(Debug, Clone)]
pub struct VersionRule {
    op: RuleOp,
    cp: String,
    version: Version,
}

impl VersionRule {
    /// Parse a version atom
    pub fn parse(atom: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidRule(atom.to_string());

        let (op, rest) = [
            (">=", RuleOp::GreaterOrEqual),
            ("<=", RuleOp::LessOrEqual),
            (">", RuleOp::Greater),
            ("<", RuleOp::Less),
            ("=", RuleOp::Equal),
            ("~", RuleOp::AnyRevision),
        ]
        .into_iter()
        .find_map(|(prefix, op)| atom.strip_prefix(prefix).map(|rest| (op, rest)))
        .ok_or_else(invalid)?;

        let (op, rest) = match rest.strip_suffix('*') {
            Some(stripped) if op == RuleOp::Equal => (RuleOp::EqualGlob, stripped),
            Some(_) => return Err(invalid()),
            None => (op, rest),
        };

        let identity = PackageIdentity::parse(rest).map_err(|_| invalid())?;

        Ok(Self {
            op,
            cp: identity.cp().to_string(),
            version: identity.version().clone(),
        })
    }

    /// Whether `version` of `cp` falls under this rule
    pub fn matches(&self, cp: &str, version: &str) -> bool {
        if self.cp != cp {
            return false;
        }

        if self.op == RuleOp::EqualGlob {
            return version.starts_with(self.version.as_str());
        }

        let Some(candidate) = Version::parse(version) else {
            // Only exact rules can match versions outside the grammar
            return matches!(self.op, RuleOp::Equal | RuleOp::AnyRevision)
                && version == self.version.as_str();
        };

        match self.op {
            RuleOp::Less => candidate < self.version,
            RuleOp::LessOrEqual => candidate <= self.version,
            RuleOp::Equal | RuleOp::AnyRevision => candidate == self.version,
            RuleOp::GreaterOrEqual => candidate >= self.version,
            RuleOp::Greater => candidate > self.version,
            RuleOp::EqualGlob => unreachable!("handled above"),
        }
    }
}

/// Static package and version exclusions
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    packages: HashSet<String>,
    versions: Vec<VersionRule>,
}

impl Blacklist {
    pub fn new(packages: HashSet<String>, versions: Vec<VersionRule>) -> Self {
        Self { packages, versions }
    }

    /// Build a blacklist from configuration, rejecting unparseable rules
    pub fn from_config(config: &BlacklistConfig) -> Result<Self, ConfigError> {
        let versions = config
            .versions
            .iter()
            .map(|atom| VersionRule::parse(atom))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            packages: config.packages.iter().cloned().collect(),
            versions,
        })
    }

    /// Whether the whole package is excluded
    pub fn is_package_blacklisted(&self, cp: &str) -> bool {
        self.packages.contains(cp)
    }

    /// Whether a discovered version of `cp` is excluded
    pub fn is_version_blacklisted(&self, cp: &str, version: &str) -> bool {
        self.versions.iter().any(|rule| rule.matches(cp, version))
    }
}
