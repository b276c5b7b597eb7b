//! Output sink for scan metadata, messages and results

use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use mockall::automock;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::scan::ScanResult;

/// Trait for receiving what a scan reports besides its return value
#[cfg_attr(test, automock)]
pub trait OutputSink: Send + Sync {
    /// Record a metadata entry; `show` marks it for human readable display
    fn metadata(&self, key: &str, value: Value, show: bool);

    /// Informational message
    fn info(&self, message: &str);

    /// Non-fatal problem
    fn warn(&self, message: &str);

    /// One entry of the final result set
    fn result(&self, result: &ScanResult);
}

/// Human readable report entry
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine<'a> {
    Info(&'a str),
    Warning(&'a str),
    Metadata(&'a str, &'a Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Shown {
    Info(usize),
    Warning(usize),
    Metadata(String),
}

/// Everything reported during one scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub metadata: IndexMap<String, Value>,
    /// Displayable events in emission order
    #[serde(skip)]
    shown: Vec<Shown>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub results: Vec<ScanResult>,
}

impl Report {
    /// Messages, warnings and displayed metadata in emission order
    pub fn lines(&self) -> impl Iterator<Item = ReportLine<'_>> {
        self.shown.iter().filter_map(|entry| match entry {
            Shown::Info(idx) => self.messages.get(*idx).map(|m| ReportLine::Info(m)),
            Shown::Warning(idx) => self.warnings.get(*idx).map(|w| ReportLine::Warning(w)),
            Shown::Metadata(key) => self
                .metadata
                .get_key_value(key)
                .map(|(k, v)| ReportLine::Metadata(k, v)),
        })
    }
}

/// Sink collecting a [`Report`] and mirroring every event to the log
pub struct ReportOutput {
    quiet: bool,
    report: Mutex<Report>,
}

impl ReportOutput {
    /// `quiet` drops informational messages
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            report: Mutex::new(Report::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Report> {
        // A panicking writer cannot leave a Report half-updated in a harmful way
        self.report.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of what has been reported so far
    pub fn report(&self) -> Report {
        self.lock().clone()
    }
}

impl OutputSink for ReportOutput {
    fn metadata(&self, key: &str, value: Value, show: bool) {
        debug!("metadata {} = {}", key, value);
        let mut report = self.lock();
        if show
            && !report
                .shown
                .iter()
                .any(|entry| matches!(entry, Shown::Metadata(k) if k == key))
        {
            report.shown.push(Shown::Metadata(key.to_string()));
        }
        report.metadata.insert(key.to_string(), value);
    }

    fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        info!("{}", message);
        let mut report = self.lock();
        let idx = report.messages.len();
        report.messages.push(message.to_string());
        report.shown.push(Shown::Info(idx));
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
        let mut report = self.lock();
        let idx = report.warnings.len();
        report.warnings.push(message.to_string());
        report.shown.push(Shown::Warning(idx));
    }

    fn result(&self, result: &ScanResult) {
        info!(
            "Upstream version {} of {} found by {} at {}",
            result.version, result.cp, result.handler, result.url
        );
        self.lock().results.push(result.clone());
    }
}
