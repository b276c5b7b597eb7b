//! Deduplication and blacklist filtering of raw findings

use indexmap::IndexMap;

use crate::blacklist::Blacklist;
use crate::handler::Finding;
use crate::scan::ScanResult;

/// Keep one finding per version and drop blacklisted versions.
///
/// When several findings report the same version, the one with the strictly
/// longest URL wins (a release archive URL over a directory URL); ties keep
/// the first seen. Output follows the first-seen order of each version.
pub fn filter_versions(cp: &str, findings: Vec<Finding>, blacklist: &Blacklist) -> Vec<ScanResult> {
    let mut by_version: IndexMap<String, Finding> = IndexMap::new();

    for finding in findings {
        match by_version.get_mut(&finding.version) {
            Some(kept) if finding.url.len() > kept.url.len() => *kept = finding,
            Some(_) => {}
            None => {
                by_version.insert(finding.version.clone(), finding);
            }
        }
    }

    by_version
        .into_values()
        .filter(|finding| !blacklist.is_version_blacklisted(cp, &finding.version))
        .map(|finding| ScanResult {
            cp: cp.to_string(),
            url: finding.url,
            version: finding.version,
            handler: finding.handler,
            confidence: finding.confidence,
        })
        .collect()
}
