//! Generic HTTP handler
//!
//! Scans the directory listing next to a download URL for files named like the
//! current archive with a different version, and brute forces by bumping
//! version components and probing the resulting URLs.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::USER_AGENT;
use crate::error::HandlerError;
use crate::handler::{Finding, Handler};
use crate::package::identity::PackageIdentity;
use crate::package::version::is_newer;

const HANDLER_NAME: &str = "generic";

/// Confidence of a file found in a directory listing
const SCAN_CONFIDENCE: u8 = 45;

/// Confidence of a file found by probing a guessed URL
const BRUTE_FORCE_CONFIDENCE: u8 = 30;

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"'#?]+)"#).expect("href regex is valid")
});

/// Handler for plain http/https download locations
pub struct GenericHandler {
    client: reqwest::Client,
    brute_force_level: u32,
}

impl GenericHandler {
    /// Creates a handler whose requests time out after `timeout`.
    ///
    /// `brute_force_level` is how many increments are tried per version component.
    pub fn new(timeout: Duration, brute_force_level: u32) -> Result<Self, HandlerError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            brute_force_level,
        })
    }

    /// Split `url` into its directory (with trailing slash) and file name
    fn split_url(url: &str) -> Result<(&str, &str), HandlerError> {
        match url.rfind('/') {
            Some(idx) if idx + 1 < url.len() => Ok((&url[..=idx], &url[idx + 1..])),
            _ => Err(HandlerError::InvalidUrl(url.to_string())),
        }
    }

    /// Regex matching file names shaped like `filename` with any version in place of `version`
    fn filename_template(filename: &str, version: &str) -> Option<Regex> {
        let idx = filename.rfind(version)?;
        let prefix = regex::escape(&filename[..idx]);
        let suffix = regex::escape(&filename[idx + version.len()..]);
        Regex::new(&format!("^{}([0-9][0-9a-z._]*?){}$", prefix, suffix)).ok()
    }

    /// Candidate versions obtained by bumping each numeric component
    fn bumped_versions(numbers: &[String], level: u32) -> Vec<String> {
        let parsed: Option<Vec<u64>> = numbers.iter().map(|n| n.parse().ok()).collect();
        let Some(parsed) = parsed else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for (idx, current) in parsed.iter().enumerate() {
            for step in 1..=u64::from(level) {
                // Components already at the top of the range cannot be bumped
                let Some(next) = current.checked_add(step) else {
                    break;
                };
                let bumped: Vec<String> = parsed
                    .iter()
                    .enumerate()
                    .map(|(i, n)| match i.cmp(&idx) {
                        std::cmp::Ordering::Less => n.to_string(),
                        std::cmp::Ordering::Equal => next.to_string(),
                        std::cmp::Ordering::Greater => "0".to_string(),
                    })
                    .collect();
                candidates.push(bumped.join("."));
            }
        }
        candidates
    }

    /// Replace `from` with `to` in the path of `url`, leaving scheme and host untouched
    fn replace_in_path(url: &str, from: &str, to: &str) -> String {
        let path_start = url
            .find("://")
            .and_then(|scheme_end| url[scheme_end + 3..].find('/').map(|i| scheme_end + 3 + i))
            .unwrap_or(0);
        format!("{}{}", &url[..path_start], url[path_start..].replace(from, to))
    }

    async fn exists(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Probe of {} failed: {}", url, e);
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl Handler for GenericHandler {
    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    fn can_handle(&self, _package: &PackageIdentity, url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    async fn scan(
        &self,
        package: &PackageIdentity,
        url: &str,
    ) -> Result<Vec<Finding>, HandlerError> {
        let (directory, filename) = Self::split_url(url)?;
        let current = package.version().as_str();

        let Some(template) = Self::filename_template(filename, current) else {
            debug!("'{}' does not contain version {}", filename, current);
            return Ok(Vec::new());
        };

        let base = Url::parse(directory).map_err(|_| HandlerError::InvalidUrl(url.to_string()))?;

        let response = self.client.get(base.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("Directory listing {} returned status {}", base, status);
            return Ok(Vec::new());
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read directory listing {}: {}", base, e);
            HandlerError::InvalidResponse(e.to_string())
        })?;

        let mut findings: Vec<Finding> = Vec::new();
        for caps in HREF_RE.captures_iter(&body) {
            let href = &caps[1];
            let name = href.trim_end_matches('/').rsplit('/').next().unwrap_or(href);

            let Some(found) = template.captures(name) else {
                continue;
            };
            let version = &found[1];
            if !is_newer(version, current) || findings.iter().any(|f| f.version == version) {
                continue;
            }

            let Ok(file_url) = base.join(href) else {
                continue;
            };
            findings.push(Finding::new(
                file_url.as_str(),
                version,
                HANDLER_NAME,
                SCAN_CONFIDENCE,
            ));
        }

        debug!("Found {} newer files in {}", findings.len(), base);
        Ok(findings)
    }

    async fn brute_force(
        &self,
        package: &PackageIdentity,
        url: &str,
    ) -> Result<Vec<Finding>, HandlerError> {
        if self.brute_force_level == 0 {
            return Ok(Vec::new());
        }

        let (_, filename) = Self::split_url(url)?;
        let current = package.version().as_str();
        if !filename.contains(current) {
            debug!("'{}' does not contain version {}", filename, current);
            return Ok(Vec::new());
        }

        let mut findings = Vec::new();
        for candidate in Self::bumped_versions(package.version().numbers(), self.brute_force_level) {
            let candidate_url = Self::replace_in_path(url, current, &candidate);
            if self.exists(&candidate_url).await {
                findings.push(Finding::new(
                    candidate_url,
                    candidate,
                    HANDLER_NAME,
                    BRUTE_FORCE_CONFIDENCE,
                ));
            }
        }

        Ok(findings)
    }
}
