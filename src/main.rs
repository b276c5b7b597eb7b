use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use upstream_scan::blacklist::Blacklist;
use upstream_scan::config::{self, OutputFormat, ScanConfig};
use upstream_scan::handler::HandlerRegistry;
use upstream_scan::metadata::SrcUriParser;
use upstream_scan::package::PackageIndex;
use upstream_scan::scan::{Progress, Report, ReportLine, ReportOutput, Scanner};

#[derive(Parser)]
#[command(name = "upstream-scan")]
#[command(version, about = "Discover newer upstream releases of packages")]
struct Cli {
    /// Package name, `category/name`, `=category/name-version` or a recipe path
    query: String,

    /// Configuration file (defaults to the one in the data directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Package index file (defaults to the one in the data directory)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Only report results
    #[arg(short, long)]
    quiet: bool,

    /// Machine readable output
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Stop at the first URL that yields a finding
    #[arg(short = '1', long)]
    oneshot: bool,

    /// Brute force level, 0 disables probing
    #[arg(short, long)]
    brute_force: Option<u32>,

    /// Do not scan directory listings
    #[arg(long)]
    no_scan_dir: bool,

    /// Scan every declared file regardless of USE flags
    #[arg(short, long)]
    mirror: bool,
}

impl Cli {
    fn apply(&self, config: &mut ScanConfig) {
        config.quiet |= self.quiet;
        config.oneshot |= self.oneshot;
        config.mirror |= self.mirror;
        if self.no_scan_dir {
            config.scan_dir = false;
        }
        if let Some(level) = self.brute_force {
            config.brute_force = level;
        }
        if self.format.is_some() {
            config.format = self.format;
        }
    }
}

fn init_logging() -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = config::log_path();
    let dir = log_path.parent().map(PathBuf::from).unwrap_or_default();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let file_name = log_path
        .file_name()
        .context("log path has no file name")?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, file_name));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

fn print_report(report: &Report, format: Option<OutputFormat>) -> anyhow::Result<()> {
    match format {
        Some(OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        None => {
            for line in report.lines() {
                match line {
                    ReportLine::Info(message) => println!("{}", message),
                    ReportLine::Warning(message) => eprintln!("warning: {}", message),
                    ReportLine::Metadata(key, value) => match value.as_str() {
                        Some(text) => println!("{}: {}", key, text),
                        None => println!("{}: {}", key, value),
                    },
                }
            }
            for result in &report.results {
                println!(
                    "Upstream Version: {} {} ({}, {}%)",
                    result.version, result.url, result.handler, result.confidence
                );
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    let mut config = ScanConfig::load_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);
    info!("upstream-scan v{}", env!("CARGO_PKG_VERSION"));

    let index_path = cli.index.clone().unwrap_or_else(config::index_path);
    let index = PackageIndex::load(&index_path)
        .with_context(|| format!("failed to load package index {}", index_path.display()))?;

    let blacklist = Blacklist::from_config(&config.blacklist)?;
    let handlers = HandlerRegistry::with_defaults(&config)?;
    let parser = SrcUriParser::new(config.mirrors.clone());
    let output = Arc::new(ReportOutput::new(config.quiet));
    let format = config.format;

    let scanner = Scanner::new(
        config,
        Arc::new(index),
        Arc::new(parser),
        Arc::new(handlers),
        Arc::new(blacklist),
        output.clone(),
    );

    let results = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(scanner.scan_upstream(&cli.query, Progress::disabled()));

    print_report(&output.report(), format)?;

    Ok(match results {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    })
}
