//! Package index test utilities

use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

/// Index entry: cpv, SRC_URI
pub type IndexEntry<'a> = (&'a str, &'a str);

/// Write an index file holding `entries` into a fresh temporary directory
pub fn create_test_index(entries: &[IndexEntry]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("packages.json");

    let packages: Vec<_> = entries
        .iter()
        .map(|(cpv, src_uri)| {
            json!({
                "cpv": cpv,
                "environment": {
                    "SRC_URI": src_uri,
                    "HOMEPAGE": "https://example.org",
                    "DESCRIPTION": "Test package",
                },
            })
        })
        .collect();

    std::fs::write(&path, json!({ "packages": packages }).to_string()).unwrap();
    (temp_dir, path)
}
