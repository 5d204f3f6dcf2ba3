//! Rainfall HTTP service.
//!
//! Syncs the regional rainfall artifact from the GSMaP archive on request
//! and serves the last synced collection.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use artifact_cache::{ArtifactCache, RainwatchConfig};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use rainfall_api::{server, FtpConnectorFactory, ServerState};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rainfall-api")]
#[command(about = "On-demand GSMaP rainfall sync and artifact API")]
struct Args {
    /// Archive and sync configuration file
    #[arg(long, env = "RAINWATCH_CONFIG", default_value = "config/archive.yaml")]
    config: PathBuf,

    /// Port for the HTTP server
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Override the artifact path from the config file
    #[arg(long, env = "RAINFALL_ARTIFACT_PATH")]
    artifact_path: Option<PathBuf>,

    /// Upper bound on one sync request, in seconds
    #[arg(long, env = "SYNC_TIMEOUT_SECS", default_value = "300")]
    sync_timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let mut config = RainwatchConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(path) = args.artifact_path {
        config.sync.artifact_path = path;
    }

    info!(
        endpoint = %config.archive.endpoint(),
        artifact = %config.sync.artifact_path.display(),
        sync_timeout_secs = args.sync_timeout_secs,
        "Starting rainfall API"
    );

    let cache = ArtifactCache::from_config(&config.archive, config.sync);
    let state = Arc::new(ServerState::new(
        config.archive,
        cache,
        FtpConnectorFactory,
        Duration::from_secs(args.sync_timeout_secs),
        metrics,
    ));

    server::run_server(state, args.port).await
}
