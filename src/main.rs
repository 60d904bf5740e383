//! Governor Stats Scanner
//!
//! Walks the in-game individual power rankings on an Android device over
//! adb, reads each governor's stats with Tesseract and stores them in a
//! local SQLite database for CSV export.

mod clipboard;
mod config;
mod device;
mod export;
mod layout;
mod matcher;
mod ocr;
mod paths;
mod record;
mod scan;
mod store;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::clipboard::SystemClipboard;
use crate::config::ScanConfig;
use crate::device::AdbDevice;
use crate::matcher::{GrayTemplateMatcher, TemplateSet};
use crate::ocr::{FieldExtractor, TesseractEngine};
use crate::scan::{Collaborators, ScanController, ScanMode, ScanSession, ThreadSleeper};
use crate::store::SqliteStore;

const LOG_FILE: &str = "governor_scan.log";

#[derive(Parser)]
#[command(name = "governor-scan")]
#[command(about = "Scan governor stats from the power rankings into a local database")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the top governors of the power rankings
    Scan(ScanArgs),
    /// Write the stored governors to a CSV file, ordered by power
    Export {
        /// Output file; defaults to a timestamped file next to the executable
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Number of governors to scan
    #[arg(short = 'n', long, default_value = "300")]
    top: u32,

    /// Start a new epoch: create missing governors instead of requiring them
    #[arg(long)]
    new_epoch: bool,

    /// Reset the stored base power (new epoch only)
    #[arg(long, requires = "new_epoch")]
    reset_power: bool,

    /// Reset the stored base kill points (new epoch only)
    #[arg(long, requires = "new_epoch")]
    reset_kp: bool,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let log_path = paths::get_logs_dir().join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure output directories exist
    paths::ensure_directories()?;
    init_tracing(cli.verbose)?;

    // Route panics through the log file as well
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        error!("[PANIC]{} {}", location, msg);
    }));

    config::init_config();
    let config = config::get_config();

    let result = match cli.command {
        Command::Scan(args) => run_scan(&args, config),
        Command::Export { output } => run_export(output, config),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn run_scan(args: &ScanArgs, config: &ScanConfig) -> Result<()> {
    let mode = if args.new_epoch {
        ScanMode::NewEpoch
    } else {
        ScanMode::Continuing
    };
    info!(
        "Scanning top {} governors ({:?}, reset power: {}, reset kp: {})",
        args.top, mode, args.reset_power, args.reset_kp
    );

    let tesseract = ocr::ensure_tesseract(
        config.tesseract_path.as_deref(),
        config.tessdata_dir.as_deref(),
    )?;
    let templates = TemplateSet::load(&paths::get_template_dir())?;

    let mut device = AdbDevice::new(config.adb_path.clone(), config.device_serial.clone());
    let matcher = GrayTemplateMatcher::new(config.template_max_score);
    let mut engine = TesseractEngine::new(tesseract)?;
    let mut clipboard = SystemClipboard::new()?;
    let mut store = SqliteStore::open(&config.database_path())?;
    let mut sleeper = ThreadSleeper;

    let session =
        ScanSession::new(args.top, mode, config).with_resets(args.reset_power, args.reset_kp);
    let extractor = FieldExtractor::new(
        &config.layout,
        config.binarize_threshold,
        config.blur_sigma,
        config.ocr_engine_mode,
    );

    let mut controller = ScanController::new(
        session,
        config.layout.clone(),
        extractor,
        templates,
        Collaborators {
            device: &mut device,
            matcher: &matcher,
            ocr: &mut engine,
            clipboard: &mut clipboard,
            store: &mut store,
            sleeper: &mut sleeper,
        },
    )
    .with_capture_path(paths::get_temp_dir().join("governor-profile.png"));

    let report = controller.run()?;
    info!(
        "Done: {} of {} governors stored, {} navigation failures",
        report.committed(),
        args.top,
        report.failure_count
    );
    Ok(())
}

fn run_export(output: Option<PathBuf>, config: &ScanConfig) -> Result<()> {
    let output = output.unwrap_or_else(|| {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        paths::get_exe_dir().join(format!("governors_{}.csv", timestamp))
    });

    let mut store = SqliteStore::open(&config.database_path())?;
    let count = export::export_to_csv(&mut store, &output)?;
    info!("Exported {} governors to {}", count, output.display());
    Ok(())
}
