//! Scan orchestration for a single package query

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::blacklist::Blacklist;
use crate::config::{
    PROGRESS_FINALIZE, PROGRESS_METADATA, PROGRESS_RESOLVE, PROGRESS_URLS, ScanConfig,
};
use crate::error::ScanError;
use crate::handler::HandlerRegistry;
use crate::metadata::SourceUriParser;
use crate::package::query::{PackageQuery, PackageRecord};
use crate::scan::ScanResult;
use crate::scan::dispatch::UrlDispatcher;
use crate::scan::output::OutputSink;
use crate::scan::progress::Progress;

/// Resolves a query to one package and scans its download locations
pub struct Scanner {
    config: ScanConfig,
    query: Arc<dyn PackageQuery>,
    parser: Arc<dyn SourceUriParser>,
    handlers: Arc<HandlerRegistry>,
    blacklist: Arc<Blacklist>,
    output: Arc<dyn OutputSink>,
}

impl Scanner {
    pub fn new(
        config: ScanConfig,
        query: Arc<dyn PackageQuery>,
        parser: Arc<dyn SourceUriParser>,
        handlers: Arc<HandlerRegistry>,
        blacklist: Arc<Blacklist>,
        output: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            config,
            query,
            parser,
            handlers,
            blacklist,
            output,
        }
    }

    /// Scan upstream for newer versions of the package matching `query`.
    ///
    /// Returns `None` when no eligible package was found or its source
    /// declaration is invalid; the reason is reported as a warning. A scan
    /// that finds nothing returns an empty list.
    pub async fn scan_upstream(
        &self,
        query: &str,
        mut progress: Progress<'_>,
    ) -> Option<Vec<ScanResult>> {
        self.try_scan(query, &mut progress)
            .await
            .inspect_err(|e| {
                warn!("Scan of '{}' aborted: {}", query, e);
                self.output.warn(&e.to_string());
            })
            .ok()
    }

    async fn try_scan(
        &self,
        query: &str,
        progress: &mut Progress<'_>,
    ) -> Result<Vec<ScanResult>, ScanError> {
        let matches = self.resolve(query)?;
        let package = select_candidate(query, matches)?;
        let cpv = package.cpv();
        info!("Scanning {}", cpv);

        let start_time = Local::now();
        self.output
            .metadata("datetime", json!(start_time.to_rfc3339()), false);
        self.output.metadata("cp", json!(package.cp()), false);
        self.output.metadata("cpv", json!(cpv), false);

        progress.report(PROGRESS_RESOLVE);

        if self.blacklist.is_package_blacklisted(package.cp()) {
            return Err(ScanError::Blacklisted(package.cp().to_string()));
        }

        if !self.config.quiet {
            self.describe(&package);
        }

        let src_uri = package.environment("SRC_URI");
        let use_flags: HashSet<String> = self.config.use_flags.iter().cloned().collect();
        let expand = |flags: Option<&HashSet<String>>| {
            self.parser
                .parse(&cpv, src_uri, flags)
                .map_err(|source| ScanError::Metadata {
                    cpv: cpv.clone(),
                    source,
                })
        };
        let used = expand(Some(&use_flags))?;
        let all = expand(None)?;

        progress.report(PROGRESS_METADATA);

        let urls = if self.config.mirror { all } else { used };
        debug!(
            "{} declares {} file(s), {} URL(s)",
            cpv,
            urls.len(),
            urls.values().map(Vec::len).sum::<usize>()
        );

        let scan_time = (Local::now() - start_time).num_milliseconds() as f64 / 1000.0;
        self.output.metadata("scan_time", json!(scan_time), false);

        let results = UrlDispatcher::new(
            &self.handlers,
            &self.blacklist,
            &self.config,
            self.output.as_ref(),
        )
        .scan_urls(&cpv, &urls, PROGRESS_URLS, progress)
        .await?;

        progress.report(PROGRESS_FINALIZE);

        for result in &results {
            self.output.result(result);
        }

        info!("{}: {} upstream version(s) found", cpv, results.len());
        Ok(results)
    }

    /// Find the packages matching `query`, which may be a recipe path
    fn resolve(&self, query: &str) -> Result<Vec<PackageRecord>, ScanError> {
        if !query.ends_with(".ebuild") {
            return Ok(self.query.find(query)?);
        }

        let Some(cpv) = self.query.package_from_ebuild(Path::new(query))? else {
            return Ok(Vec::new());
        };

        // The recipe may not be indexed yet
        self.query.refresh_index()?;
        Ok(self.query.find(&format!("={}", cpv))?)
    }

    fn describe(&self, package: &PackageRecord) {
        if self.config.format.is_none() {
            self.output
                .info(&format!(" * {} [{}]", package.cpv(), package.repo_name()));
        } else {
            self.output
                .metadata("overlay", json!(package.repo_name()), true);
        }

        if let Some(path) = package.ebuild_path() {
            self.output
                .metadata("ebuild", json!(path.display().to_string()), true);
        }

        self.output
            .metadata("repository", json!(package.repo_name()), true);
        self.output
            .metadata("homepage", json!(package.environment("HOMEPAGE")), true);
        self.output.metadata(
            "description",
            json!(package.environment("DESCRIPTION")),
            true,
        );
    }
}

/// Pick the highest version that is not a live build
fn select_candidate(
    query: &str,
    mut matches: Vec<PackageRecord>,
) -> Result<PackageRecord, ScanError> {
    matches.sort();

    let mut package = matches
        .pop()
        .ok_or_else(|| ScanError::NotFound(query.to_string()))?;

    while package.is_live() {
        match matches.pop() {
            Some(next) => package = next,
            None => return Err(ScanError::DevOnly(package.cp().to_string())),
        }
    }

    Ok(package)
}
