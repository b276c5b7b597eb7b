//! Upstream version handlers
//!
//! A handler recognizes a hosting pattern or protocol and extracts candidate
//! versions from a download URL.
//!
//! # Modules
//!
//! - [`registry`]: ordered set of handlers, picks the one serving a URL
//! - [`generic`]: HTTP directory listing scan and brute force probing

pub mod generic;
pub mod registry;

pub use generic::GenericHandler;
pub use registry::HandlerRegistry;

#[cfg(test)]
use mockall::automock;

use serde::Serialize;

use crate::error::HandlerError;
use crate::package::identity::PackageIdentity;

/// One candidate version discovered from one URL by one handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub url: String,
    pub version: String,
    pub handler: String,
    /// Self-reported reliability, display only
    pub confidence: u8,
}

impl Finding {
    pub fn new(
        url: impl Into<String>,
        version: impl Into<String>,
        handler: impl Into<String>,
        confidence: u8,
    ) -> Self {
        Self {
            url: url.into(),
            version: version.into(),
            handler: handler.into(),
            confidence,
        }
    }
}

/// Trait for discovering upstream versions from a download URL
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    /// Name reported in findings and fault logs
    fn name(&self) -> &'static str;

    /// Whether this handler understands `url`
    fn can_handle(&self, package: &PackageIdentity, url: &str) -> bool;

    /// Look for newer versions next to `url`
    async fn scan(&self, package: &PackageIdentity, url: &str)
    -> Result<Vec<Finding>, HandlerError>;

    /// Guess newer versions by mutating the version inside `url` and probing
    async fn brute_force(
        &self,
        package: &PackageIdentity,
        url: &str,
    ) -> Result<Vec<Finding>, HandlerError>;
}
