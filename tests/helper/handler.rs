//! Handler test utilities

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use upstream_scan::error::HandlerError;
use upstream_scan::handler::{Finding, Handler};
use upstream_scan::package::PackageIdentity;

/// Handler answering from canned findings and recording every call
#[derive(Default)]
pub struct FakeHandler {
    scans: HashMap<String, Vec<Finding>>,
    probes: HashMap<String, Vec<Finding>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Findings returned by `scan(url)`, as (url, version, confidence)
    pub fn with_scan(mut self, url: &str, findings: &[(&str, &str, u8)]) -> Self {
        self.scans.insert(url.to_string(), Self::findings(findings));
        self
    }

    /// Findings returned by `brute_force(url)`
    pub fn with_probe(mut self, url: &str, findings: &[(&str, &str, u8)]) -> Self {
        self.probes.insert(url.to_string(), Self::findings(findings));
        self
    }

    /// Make both operations fail for `url`
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Calls made so far, as `scan <url>` or `brute_force <url>`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn findings(findings: &[(&str, &str, u8)]) -> Vec<Finding> {
        findings
            .iter()
            .map(|(url, version, confidence)| Finding::new(*url, *version, "fake", *confidence))
            .collect()
    }

    fn answer(
        &self,
        operation: &str,
        url: &str,
        canned: &HashMap<String, Vec<Finding>>,
    ) -> Result<Vec<Finding>, HandlerError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", operation, url));

        if self.failing.contains(url) {
            return Err(HandlerError::InvalidResponse(format!("{} refused", url)));
        }
        Ok(canned.get(url).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl Handler for FakeHandler {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn can_handle(&self, _package: &PackageIdentity, url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://") || url.starts_with("ftp://")
    }

    async fn scan(
        &self,
        _package: &PackageIdentity,
        url: &str,
    ) -> Result<Vec<Finding>, HandlerError> {
        self.answer("scan", url, &self.scans)
    }

    async fn brute_force(
        &self,
        _package: &PackageIdentity,
        url: &str,
    ) -> Result<Vec<Finding>, HandlerError> {
        self.answer("brute_force", url, &self.probes)
    }
}
