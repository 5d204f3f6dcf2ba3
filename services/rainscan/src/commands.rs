//! Subcommand implementations.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use archive_client::{ArchiveClient, ArchiveConnector, ArchiveLayout, StagingArea};
use artifact_cache::{ArtifactCache, RainwatchConfig, SyncOutcome, SyncTarget};
use chrono::NaiveDate;
use event_scanner::{find_profile, load_profiles, EventScanner, ScanRequest};
use rain_common::{regions, BoundingBox, DayPath, YearMonth};
use tracing::info;

use crate::cli::{AdHocScan, Command, ScanArgs};

/// Everything a command needs besides the connector.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: RainwatchConfig,
    pub profiles_dir: PathBuf,
    /// Anchors `recent_months` windows
    pub today: NaiveDate,
}

impl Context {
    fn layout(&self, archive_root: Option<&str>) -> ArchiveLayout {
        match archive_root {
            Some(root) => self.config.archive.layout.with_root(root),
            None => self.config.archive.layout.clone(),
        }
    }

    fn staging(&self) -> StagingArea {
        StagingArea::new(self.config.archive.staging_dir.clone())
    }
}

/// Run one command, writing its output to `out`.
pub fn execute<C: ArchiveConnector>(
    command: &Command,
    ctx: &Context,
    connector: &C,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Scan(args) => scan(args, ctx, connector, out),
        Command::Sync { date, hour } => sync(date.as_deref(), hour.as_deref(), ctx, connector, out),
        Command::Profiles => profiles(ctx, out),
        Command::Days {
            month,
            archive_root,
        } => days(month, archive_root.as_deref(), ctx, connector, out),
        Command::Snapshots {
            date,
            latest,
            archive_root,
        } => snapshots(*date, *latest, archive_root.as_deref(), ctx, connector, out),
    }
}

fn scan<C: ArchiveConnector>(args: &ScanArgs, ctx: &Context, connector: &C, out: &mut dyn Write) -> Result<()> {
    let request = match &args.profile {
        Some(name) => {
            if !args.adhoc.is_empty() {
                bail!("scan flags cannot be combined with a profile");
            }
            let profile = find_profile(&ctx.profiles_dir, name)?;
            info!(profile = %profile.name, "Running scan profile");
            profile.to_request(ctx.today)?
        }
        None => adhoc_request(&args.adhoc, ctx.today)?,
    };

    let scanner = EventScanner::from_config(&ctx.config.archive);
    let report = scanner.scan(connector, &request)?;

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn adhoc_request(args: &AdHocScan, today: NaiveDate) -> Result<ScanRequest> {
    let window = args.window(today)?;
    let Some(traversal) = args.traversal else {
        bail!("--traversal is required for an ad hoc scan");
    };
    let Some(threshold) = args.threshold else {
        bail!("--threshold is required for an ad hoc scan");
    };
    let region = match &args.region {
        Some(name) => parse_region(name)?,
        None => regions::QUEZON_CITY,
    };

    let mut request = ScanRequest::new(window, traversal.into(), region, threshold);
    if let Some(sampling) = &args.sampling {
        request = request.with_sampling(sampling.clone());
    }
    if let Some(max_days) = args.max_days {
        request = request.with_max_days(max_days);
    }
    if let Some(root) = &args.archive_root {
        request = request.with_archive_root(root);
    }
    request.validate()?;
    Ok(request)
}

fn parse_region(name: &str) -> Result<BoundingBox> {
    match regions::by_name(name) {
        Some(bbox) => Ok(bbox),
        None => BoundingBox::from_region_string(name).with_context(|| format!("region '{name}'")),
    }
}

fn sync<C: ArchiveConnector>(
    date: Option<&str>,
    hour: Option<&str>,
    ctx: &Context,
    connector: &C,
    out: &mut dyn Write,
) -> Result<()> {
    let target = SyncTarget::parse(date, hour)?;
    let cache = ArtifactCache::from_config(&ctx.config.archive, ctx.config.sync.clone());

    let result = cache.sync(connector, target);
    let outcome = SyncOutcome::from(&result);
    let summary = result?;

    writeln!(out, "{}", outcome.message)?;
    writeln!(
        out,
        "wrote {} ({})",
        cache.store().path().display(),
        summary.filename
    )?;
    Ok(())
}

fn profiles(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let profiles = load_profiles(&ctx.profiles_dir)?;
    if profiles.is_empty() {
        writeln!(out, "no scan profiles in {}", ctx.profiles_dir.display())?;
        return Ok(());
    }
    for profile in profiles {
        writeln!(
            out,
            "{:<18} {:<10} {}",
            profile.name,
            profile.traversal.to_string(),
            profile.description
        )?;
    }
    Ok(())
}

fn days<C: ArchiveConnector>(
    month: &str,
    archive_root: Option<&str>,
    ctx: &Context,
    connector: &C,
    out: &mut dyn Write,
) -> Result<()> {
    let period = YearMonth::parse(month)?;
    let mut client = ArchiveClient::open(connector, ctx.layout(archive_root), ctx.staging())?;
    let listed = client.try_list_days(period);
    client.close();

    for day in listed? {
        writeln!(out, "{period}-{day}")?;
    }
    Ok(())
}

fn snapshots<C: ArchiveConnector>(
    date: Option<NaiveDate>,
    latest: bool,
    archive_root: Option<&str>,
    ctx: &Context,
    connector: &C,
    out: &mut dyn Write,
) -> Result<()> {
    let mut client = ArchiveClient::open(connector, ctx.layout(archive_root), ctx.staging())?;
    let listed = match (date, latest) {
        (_, true) => client.list_latest(),
        (Some(date), false) => client.list_snapshots(&DayPath::new(date)),
        (None, false) => {
            client.close();
            bail!("a date or --latest is required");
        }
    };
    client.close();

    for snapshot in listed? {
        writeln!(out, "{}  {}", snapshot.display_timestamp(), snapshot.filename)?;
    }
    Ok(())
}
