use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use peercheck::check::{CheckMode, run_check};
use peercheck::config::CheckConfig;
use peercheck::manifest::DEFAULT_MANIFEST_PATH;
use peercheck::report::{render_json, render_text};
use peercheck::scan::{DependencyReport, ScanOptions};
use peercheck::version::registries::{NpmRegistry, ThrottledRegistry};
use peercheck::version::types::HostTarget;

#[derive(Parser, Debug)]
#[command(name = "peercheck")]
#[command(
    version,
    about = "Find the first version of each dependency that supports a host package version"
)]
struct Cli {
    /// Host package name, e.g. react-native
    host: String,

    /// Host version; loose forms such as `v0.71` or `1.2` are accepted
    #[arg(value_name = "VERSION")]
    host_version: String,

    /// Check only this package instead of every dependency in the manifest
    package: Option<String>,

    /// Start the search for PACKAGE at the range the manifest declares for it
    #[arg(long, requires = "package")]
    dep: bool,

    /// Host manifest to read dependencies from
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// Registry base URL
    #[arg(long, value_name = "URL")]
    registry: Option<String>,

    /// Config file (defaults to $XDG_CONFIG_HOME/peercheck/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum number of registry requests in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Cli {
    fn mode(&self) -> CheckMode {
        match &self.package {
            Some(package) => CheckMode::Single {
                package: package.clone(),
                manifest: self.dep.then(|| self.manifest.clone()),
            },
            None => CheckMode::AllDependencies {
                manifest: self.manifest.clone(),
            },
        }
    }

    fn apply_overrides(&self, config: &mut CheckConfig) {
        if let Some(url) = &self.registry {
            config.registry.url = url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.max_concurrent_requests = concurrency;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.fetch.timeout_ms = timeout_ms;
        }
    }
}

/// Logs go to stderr, filtered by RUST_LOG (default `warn`). With a log
/// file they are written there as JSON instead; the returned guard flushes
/// it on drop.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (
                Some(fmt::layer().json().with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let stderr_layer = log_file
        .is_none()
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn run(
    host: &HostTarget,
    mode: &CheckMode,
    config: &CheckConfig,
    format: Format,
) -> anyhow::Result<ExitCode> {
    let npm = NpmRegistry::new(&config.registry.url, config.fetch.timeout())
        .context("Failed to build registry client")?;
    let registry = ThrottledRegistry::new(npm, config.fetch.max_concurrent_requests);

    let reports = run_check(&registry, host, mode, ScanOptions::from(&config.fetch)).await?;

    match format {
        Format::Text => print!("{}", render_text(&reports)),
        Format::Json => println!("{}", render_json(&reports)?),
    }

    if reports.iter().any(DependencyReport::is_error) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref())?;

    // Rejected before any network traffic
    let host = HostTarget::new(cli.host.as_str(), &cli.host_version)?;

    let mut config =
        CheckConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(&host, &cli.mode(), &config, cli.format))
}
