//! rainscan - scan and sync the GSMaP rainfall archive from the shell.

use std::io::Write;

use anyhow::{Context as _, Result};
use archive_client::FtpConnector;
use artifact_cache::RainwatchConfig;
use chrono::Utc;
use clap::Parser;
use rainscan::{execute, Cli, Context};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = RainwatchConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(host) = &cli.host {
        config.archive.host = host.clone();
    }
    if let Some(user) = &cli.user {
        config.archive.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.archive.password = password.clone();
    }
    debug!(archive = ?config.archive, "Loaded configuration");

    let connector = FtpConnector::new(config.archive.clone());
    let ctx = Context {
        config,
        profiles_dir: cli.profiles_dir.clone(),
        today: Utc::now().date_naive(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &ctx, &connector, &mut out)?;
    out.flush()?;
    Ok(())
}
