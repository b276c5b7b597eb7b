use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

// =============================================================================
// Progress budget
// =============================================================================

/// Progress reported once the package has been resolved
pub const PROGRESS_RESOLVE: f64 = 10.0;

/// Progress reported once the source declaration has been expanded
pub const PROGRESS_METADATA: f64 = 10.0;

/// Progress shared by all URLs of a package
pub const PROGRESS_URLS: f64 = 70.0;

/// Progress reported after the results are emitted
pub const PROGRESS_FINALIZE: f64 = 10.0;

// =============================================================================
// HTTP
// =============================================================================

/// Timeout for handler HTTP requests in milliseconds (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// User agent sent by handlers
pub const USER_AGENT: &str = concat!("upstream-scan/", env!("CARGO_PKG_VERSION"));

/// Output format for scan reports
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
}

/// Scan configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Suppress informational output
    pub quiet: bool,
    /// Machine readable output mode
    pub format: Option<OutputFormat>,
    /// Stop scanning at the first URL that yields a finding
    pub oneshot: bool,
    /// Run the structured handler scan for each URL
    pub scan_dir: bool,
    /// Brute force intensity, 0 disables brute forcing
    pub brute_force: u32,
    /// Scan every declared file regardless of use flags
    pub mirror: bool,
    /// Active use flags of the build environment
    pub use_flags: Vec<String>,
    /// Mirror name -> base URLs used to expand `mirror://`
    pub mirrors: HashMap<String, Vec<String>>,
    pub blacklist: BlacklistConfig,
    pub http_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            format: None,
            oneshot: false,
            scan_dir: true,
            brute_force: 0,
            mirror: false,
            use_flags: Vec::new(),
            mirrors: HashMap::new(),
            blacklist: BlacklistConfig::default(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `path` if given, otherwise the default config file when it exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = config_path();
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Blacklist entries
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Package names (`category/name`) excluded from scanning
    pub packages: Vec<String>,
    /// Version atoms (`>=category/name-1.0`) excluded from results
    pub versions: Vec<String>,
}

/// Returns the path to the data directory for upstream-scan.
/// Uses $XDG_DATA_HOME/upstream-scan if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/upstream-scan,
/// or ./upstream-scan if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default configuration file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Returns the path to the default package index.
pub fn index_path() -> PathBuf {
    data_dir().join("packages.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("upstream-scan.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("upstream-scan")
}
