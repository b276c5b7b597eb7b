//! Package scan E2E tests

mod helper;

use std::sync::Arc;

use serde_json::json;

use helper::{FakeHandler, create_test_index};
use upstream_scan::blacklist::Blacklist;
use upstream_scan::config::{BlacklistConfig, ScanConfig};
use upstream_scan::handler::HandlerRegistry;
use upstream_scan::metadata::SrcUriParser;
use upstream_scan::package::PackageIndex;
use upstream_scan::scan::{Progress, ReportOutput, ScanResult, Scanner};

struct Scan {
    results: Option<Vec<ScanResult>>,
    progress: Vec<f64>,
    output: Arc<ReportOutput>,
}

async fn run_scan(
    config: ScanConfig,
    index: &std::path::Path,
    handler: Arc<FakeHandler>,
    query: &str,
) -> Scan {
    let blacklist = Blacklist::from_config(&config.blacklist).unwrap();
    let parser = SrcUriParser::new(config.mirrors.clone());
    let mut registry = HandlerRegistry::new();
    registry.register(handler);
    let output = Arc::new(ReportOutput::new(config.quiet));

    let scanner = Scanner::new(
        config,
        Arc::new(PackageIndex::load(index).unwrap()),
        Arc::new(parser),
        Arc::new(registry),
        Arc::new(blacklist),
        output.clone(),
    );

    let mut progress = Vec::new();
    let mut callback = |inc: f64| progress.push(inc);
    let results = scanner
        .scan_upstream(query, Progress::new(&mut callback))
        .await;

    Scan {
        results,
        progress,
        output,
    }
}

fn result(url: &str, version: &str, confidence: u8) -> ScanResult {
    ScanResult {
        cp: "app-misc/foo".to_string(),
        url: url.to_string(),
        version: version.to_string(),
        handler: "fake".to_string(),
        confidence,
    }
}

#[tokio::test]
async fn reports_newer_upstream_version() {
    let (_temp_dir, index) =
        create_test_index(&[("app-misc/foo-1.0", "http://a/foo-1.0.tar.gz")]);
    let handler = Arc::new(
        FakeHandler::new().with_scan("http://a/foo-1.0.tar.gz", &[("http://a/foo-1.2.tar.gz", "1.2", 80)]),
    );

    let scan = run_scan(ScanConfig::default(), &index, handler, "app-misc/foo").await;

    assert_eq!(
        scan.results,
        Some(vec![result("http://a/foo-1.2.tar.gz", "1.2", 80)])
    );
    let report = scan.output.report();
    assert_eq!(report.results, scan.results.unwrap());
    assert_eq!(report.metadata["cp"], json!("app-misc/foo"));
    assert_eq!(report.metadata["description"], json!("Test package"));
    assert!(report.messages.contains(&" * app-misc/foo-1.0 [gentoo]".to_string()));
    assert!(
        report
            .messages
            .contains(&"SRC_URI is 'http://a/foo-1.0.tar.gz'".to_string())
    );
}

#[tokio::test]
async fn progress_increments_sum_to_one_hundred() {
    let (_temp_dir, index) = create_test_index(&[(
        "app-misc/foo-1.0",
        "http://a/foo-1.0.tar.gz http://b/foo-data-1.0.tar.gz ftp://c/foo-1.0.tar.gz",
    )]);
    let handler = Arc::new(FakeHandler::new());

    let scan = run_scan(ScanConfig::default(), &index, handler, "foo").await;

    assert_eq!(scan.results, Some(vec![]));
    assert!(scan.progress.iter().all(|inc| *inc > 0.0));
    let total: f64 = scan.progress.iter().sum();
    assert!((total - 100.0).abs() < 1e-9, "total was {}", total);
}

#[tokio::test]
async fn oneshot_stops_after_first_productive_url() {
    let (_temp_dir, index) = create_test_index(&[(
        "app-misc/foo-1.0",
        "http://a/foo-1.0.tar.gz http://b/foo-data-1.0.tar.gz",
    )]);
    let handler = Arc::new(
        FakeHandler::new().with_scan("http://a/foo-1.0.tar.gz", &[("http://a/foo-1.1.tar.gz", "1.1", 45)]),
    );
    let config = ScanConfig {
        oneshot: true,
        brute_force: 2,
        ..ScanConfig::default()
    };

    let scan = run_scan(config, &index, handler.clone(), "app-misc/foo").await;

    assert_eq!(
        scan.results,
        Some(vec![result("http://a/foo-1.1.tar.gz", "1.1", 45)])
    );
    assert_eq!(handler.calls(), vec!["scan http://a/foo-1.0.tar.gz"]);
    let total: f64 = scan.progress.iter().sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn failing_url_does_not_abort_scan() {
    let (_temp_dir, index) = create_test_index(&[(
        "app-misc/foo-1.0",
        "http://a/foo-1.0.tar.gz http://b/foo-data-1.0.tar.gz",
    )]);
    let handler = Arc::new(
        FakeHandler::new()
            .failing("http://a/foo-1.0.tar.gz")
            .with_scan("http://b/foo-data-1.0.tar.gz", &[("http://b/foo-data-1.3.tar.gz", "1.3", 45)]),
    );

    let scan = run_scan(ScanConfig::default(), &index, handler, "app-misc/foo").await;

    assert_eq!(
        scan.results,
        Some(vec![result("http://b/foo-data-1.3.tar.gz", "1.3", 45)])
    );
    let warnings = scan.output.report().warnings;
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("http://a/foo-1.0.tar.gz refused"));
}

#[tokio::test]
async fn brute_force_findings_merge_with_scan_findings() {
    let (_temp_dir, index) =
        create_test_index(&[("app-misc/foo-1.0", "http://a/foo-1.0.tar.gz")]);
    let handler = Arc::new(
        FakeHandler::new()
            .with_scan("http://a/foo-1.0.tar.gz", &[("http://a/2.0", "2.0", 10)])
            .with_probe(
                "http://a/foo-1.0.tar.gz",
                &[("http://a/foo-2.0.tar.gz", "2.0", 30), ("http://a/foo-1.1.tar.gz", "1.1", 30)],
            ),
    );
    let config = ScanConfig {
        brute_force: 1,
        ..ScanConfig::default()
    };

    let scan = run_scan(config, &index, handler, "app-misc/foo").await;

    let mut results = scan.results.unwrap();
    results.sort_by(|a, b| a.version.cmp(&b.version));
    assert_eq!(
        results,
        vec![
            result("http://a/foo-1.1.tar.gz", "1.1", 30),
            result("http://a/foo-2.0.tar.gz", "2.0", 30),
        ]
    );
}

#[tokio::test]
async fn blacklisted_versions_are_dropped() {
    let (_temp_dir, index) =
        create_test_index(&[("app-misc/foo-1.0", "http://a/foo-1.0.tar.gz")]);
    let handler = Arc::new(FakeHandler::new().with_scan(
        "http://a/foo-1.0.tar.gz",
        &[("http://a/foo-1.1.tar.gz", "1.1", 45), ("http://a/foo-2.0_beta1.tar.gz", "2.0_beta1", 45)],
    ));
    let config = ScanConfig {
        blacklist: BlacklistConfig {
            versions: vec![">=app-misc/foo-2.0_alpha".to_string()],
            ..BlacklistConfig::default()
        },
        ..ScanConfig::default()
    };

    let scan = run_scan(config, &index, handler, "app-misc/foo").await;

    assert_eq!(
        scan.results,
        Some(vec![result("http://a/foo-1.1.tar.gz", "1.1", 45)])
    );
}

#[tokio::test]
async fn blacklisted_package_is_not_scanned() {
    let (_temp_dir, index) =
        create_test_index(&[("app-misc/foo-1.0", "http://a/foo-1.0.tar.gz")]);
    let handler = Arc::new(FakeHandler::new());
    let config = ScanConfig {
        blacklist: BlacklistConfig {
            packages: vec!["app-misc/foo".to_string()],
            ..BlacklistConfig::default()
        },
        ..ScanConfig::default()
    };

    let scan = run_scan(config, &index, handler.clone(), "app-misc/foo").await;

    assert_eq!(scan.results, None);
    assert!(handler.calls().is_empty());
    assert_eq!(
        scan.output.report().warnings,
        vec!["Package 'app-misc/foo' is blacklisted"]
    );
}

#[tokio::test]
async fn dev_only_package_is_rejected() {
    let (_temp_dir, index) =
        create_test_index(&[("app-misc/foo-9999", ""), ("app-misc/foo-2.9999", "")]);
    let handler = Arc::new(FakeHandler::new());

    let scan = run_scan(ScanConfig::default(), &index, handler, "foo").await;

    assert_eq!(scan.results, None);
    assert!(scan.progress.is_empty());
}

#[tokio::test]
async fn unknown_package_is_reported() {
    let (_temp_dir, index) = create_test_index(&[]);
    let handler = Arc::new(FakeHandler::new());

    let scan = run_scan(ScanConfig::default(), &index, handler, "app-misc/nope").await;

    assert_eq!(scan.results, None);
    assert_eq!(
        scan.output.report().warnings,
        vec!["No package matching 'app-misc/nope'"]
    );
}

#[tokio::test]
async fn mirror_urls_are_expanded() {
    let (_temp_dir, index) =
        create_test_index(&[("app-misc/foo-1.0", "mirror://gnu/foo/foo-1.0.tar.gz")]);
    let handler = Arc::new(FakeHandler::new());
    let config = ScanConfig {
        mirrors: [(
            "gnu".to_string(),
            vec![
                "https://ftp.gnu.org/gnu".to_string(),
                "ftp://mirror.example/gnu/".to_string(),
            ],
        )]
        .into_iter()
        .collect(),
        ..ScanConfig::default()
    };

    let _ = run_scan(config, &index, handler.clone(), "app-misc/foo").await;

    assert_eq!(
        handler.calls(),
        vec![
            "scan https://ftp.gnu.org/gnu/foo/foo-1.0.tar.gz",
            "scan ftp://mirror.example/gnu/foo/foo-1.0.tar.gz",
        ]
    );
}

#[tokio::test]
async fn quiet_mode_suppresses_messages() {
    let (_temp_dir, index) =
        create_test_index(&[("app-misc/foo-1.0", "http://a/foo-1.0.tar.gz")]);
    let handler = Arc::new(FakeHandler::new());
    let config = ScanConfig {
        quiet: true,
        ..ScanConfig::default()
    };

    let scan = run_scan(config, &index, handler, "app-misc/foo").await;

    let report = scan.output.report();
    assert_eq!(scan.results, Some(vec![]));
    assert!(report.messages.is_empty());
    assert!(!report.metadata.contains_key("homepage"));
    assert!(report.metadata.contains_key("cpv"));
}
