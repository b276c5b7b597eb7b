//! URL dispatch: run the handlers over every declared download location

use tracing::{debug, warn};

use crate::blacklist::Blacklist;
use crate::config::ScanConfig;
use crate::error::{HandlerFault, IdentityError};
use crate::handler::{Finding, HandlerRegistry};
use crate::metadata::SourceLocationMap;
use crate::package::identity::PackageIdentity;
use crate::scan::ScanResult;
use crate::scan::filter::filter_versions;
use crate::scan::output::OutputSink;
use crate::scan::progress::{Progress, ProgressBudget};

/// Runs handlers over the URLs of one package
pub struct UrlDispatcher<'a> {
    handlers: &'a HandlerRegistry,
    blacklist: &'a Blacklist,
    config: &'a ScanConfig,
    output: &'a dyn OutputSink,
}

impl<'a> UrlDispatcher<'a> {
    pub fn new(
        handlers: &'a HandlerRegistry,
        blacklist: &'a Blacklist,
        config: &'a ScanConfig,
        output: &'a dyn OutputSink,
    ) -> Self {
        Self {
            handlers,
            blacklist,
            config,
            output,
        }
    }

    /// Scan every URL of `urls` for `cpv` and return the filtered results.
    ///
    /// `budget` is spread evenly over the URLs; whatever is left when the loop
    /// ends (oneshot exit, no URLs) is reported at the end.
    pub async fn scan_urls(
        &self,
        cpv: &str,
        urls: &SourceLocationMap,
        budget: f64,
        progress: &mut Progress<'_>,
    ) -> Result<Vec<ScanResult>, IdentityError> {
        let package = PackageIdentity::parse(cpv)?;

        let url_count = urls.values().map(Vec::len).sum();
        let mut budget = ProgressBudget::new(budget, url_count);
        let mut findings: Vec<Finding> = Vec::new();

        'files: for (filename, file_urls) in urls {
            debug!("Scanning {} location(s) of {}", file_urls.len(), filename);

            for url in file_urls {
                budget.step(progress);
                self.output.info(&format!("SRC_URI is '{}'", url));

                if !url.contains("://") {
                    self.output.info(&format!("Invalid url '{}'", url));
                    continue;
                }

                if self.config.scan_dir {
                    let result = self.handlers.scan(&package, url).await;
                    self.collect(result, &mut findings);
                }

                if !findings.is_empty() && self.config.oneshot {
                    break 'files;
                }

                if self.config.brute_force > 0 {
                    let result = self.handlers.brute_force(&package, url).await;
                    self.collect(result, &mut findings);
                }

                if !findings.is_empty() && self.config.oneshot {
                    break 'files;
                }
            }
        }

        budget.flush(progress);

        Ok(filter_versions(package.cp(), findings, self.blacklist))
    }

    /// Append findings, or report the fault and carry on
    fn collect(&self, result: Result<Vec<Finding>, HandlerFault>, findings: &mut Vec<Finding>) {
        match result {
            Ok(found) => findings.extend(found),
            Err(fault) => {
                warn!("Handler {} failed: {}", fault.handler, fault.source);
                self.output.warn(&format!("Handler failed: {}", fault));
            }
        }
    }
}
