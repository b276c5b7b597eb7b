//! Upstream scan pipeline
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Orchestrator │────▶│  Dispatcher  │────▶│   Handlers   │
//! │  (resolve)   │     │ (per URL)    │     │ (scan/brute) │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                    │
//!        ▼                    ▼
//! ┌──────────────┐     ┌──────────────┐
//! │    Output    │     │    Filter    │
//! │ (report/log) │     │(dedup/black) │
//! └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`orchestrator`]: resolves a query and drives one package scan
//! - [`dispatch`]: runs handlers over each declared URL
//! - [`filter`]: deduplicates findings and applies the version blacklist
//! - [`progress`]: progress callback and budgets
//! - [`output`]: output sink trait and the report collector

pub mod dispatch;
pub mod filter;
pub mod orchestrator;
pub mod output;
pub mod progress;

pub use dispatch::UrlDispatcher;
pub use filter::filter_versions;
pub use orchestrator::Scanner;
pub use output::{OutputSink, Report, ReportLine, ReportOutput};
pub use progress::{Progress, ProgressBudget};

use serde::Serialize;

/// One discovered upstream version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub cp: String,
    pub url: String,
    pub version: String,
    pub handler: String,
    pub confidence: u8,
}
