//! Exposure check - compares a location-history export with known exposures
//!
//! Everything runs locally: the export is read from disk, nothing is sent
//! anywhere.
//!
//! Module structure:
//! - `domain/` - Timeline model, timestamps and windows
//! - `io/` - Export reader, visit egress, report output
//! - `services/` - Parser, filter, matcher, cancelable check session
//! - `infra/` - Config and scan summary

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use exposure_check::domain::window::{parse_reference_date, LookbackWindow, MAX_LOOKBACK_DAYS};
use exposure_check::infra::{Config, ScanSummary};
use exposure_check::io::{exit_code, verdict_text, CheckOutput, DirectoryExport, VisitEgress};
use exposure_check::services::{collect_recent_visits, CheckError, CheckSession};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Check a Google location-history export against known SARS-CoV-2 exposures
#[derive(Parser, Debug)]
#[command(name = "exposure-check", version, about)]
struct Args {
    /// Unpacked Takeout folder (or a single month file); overrides config
    export: Option<String>,

    /// Path to TOML configuration file (default: $CONFIG_FILE or config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Reference date, e.g. first symptoms (YYYY-MM-DD or RFC 3339); default now
    #[arg(short, long)]
    date: Option<String>,

    /// Days before the reference date to check (at most 3660)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=MAX_LOOKBACK_DAYS as i64))]
    lookback_days: Option<u32>,

    /// Read every JSON file instead of only the months covering the window
    #[arg(long)]
    all_files: bool,

    /// Write the checked visits to this JSONL file
    #[arg(long)]
    visits_out: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    // RUST_LOG overrides; default INFO
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let mut config = Config::load_from_path(&config_path);

    if let Some(export) = &args.export {
        config = config.with_export_path(export);
    }
    if let Some(days) = args.lookback_days {
        config = config.with_lookback_days(days);
    }
    if args.all_files {
        config = config.with_all_files(true);
    }
    if let Some(path) = &args.visits_out {
        config = config.with_visits_file(path);
    }
    if let Some(date) = &args.date {
        let reference = parse_reference_date(date).context("Invalid --date")?;
        config = config.with_reference_date(reference);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_json);

    info!("exposure-check starting");

    let config = load_config(&args)?;
    let reference = config.reference_date().unwrap_or_else(Utc::now);
    let window =
        LookbackWindow::days(reference, config.lookback_days()).context("Invalid lookback window")?;
    let exposures = config.exposure_table();

    info!(
        config_file = %config.config_file(),
        export = %config.export_path(),
        reference = %reference.to_rfc3339(),
        lookback_days = %config.lookback_days(),
        all_files = %config.all_files(),
        exposure_places = %exposures.place_count(),
        exposure_windows = %exposures.window_count(),
        "config_loaded"
    );

    let run_id = Uuid::now_v7();
    let session = CheckSession::new(Arc::new(exposures));
    let reader = DirectoryExport::new(config.export_path());
    let mut summary = ScanSummary::new();

    let status = match collect_recent_visits(&reader, &window, config.all_files(), &mut summary) {
        Ok(visits) => {
            if let Some(path) = config.visits_file() {
                VisitEgress::new(path)
                    .write_visits(&visits)
                    .with_context(|| format!("Failed to write visits to {}", path))?;
            }
            session.submit(visits);
            session.wait_settled().await
        }
        Err(CheckError::Parse(e)) => {
            session.report_undetermined(&e.to_string());
            session.status()
        }
        Err(CheckError::Export(e)) => {
            return Err(e).with_context(|| format!("Failed to read export {}", config.export_path()));
        }
    };

    summary.contacts = status.contacts();
    summary.finish();
    summary.log();

    if args.json {
        println!("{}", CheckOutput::new(run_id, &window, &status, &summary).to_json());
    } else {
        println!("{}", verdict_text(&status, &window));
    }

    info!(run_id = %run_id, "exposure-check finished");
    Ok(ExitCode::from(exit_code(&status)))
}
