//! Configuration types for the scanner.
//!
//! Loads settings from config.json at startup. Provides the device and OCR
//! tool locations, timing parameters, preprocessing thresholds and the UI
//! layout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

use crate::layout::Layout;
use crate::ocr::EngineMode;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<ScanConfig> = OnceLock::new();

/// Complete scanner configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// adb executable, resolved through PATH when relative
    pub adb_path: PathBuf,
    /// Serial passed as `adb -s`; None targets the only connected device
    pub device_serial: Option<String>,
    /// Android package restarted before every scan so navigation starts from
    /// the city view; None skips the restart
    pub game_package: Option<String>,
    /// Wait after relaunching the game (milliseconds)
    pub app_start_delay_ms: u64,
    /// Explicit Tesseract executable, overrides discovery
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory, overrides discovery
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract `--oem` applied to every recognition mode
    pub ocr_engine_mode: EngineMode,
    /// Wait after every tap or swipe (milliseconds)
    pub settle_delay_ms: u64,
    /// The copy-nickname retry waits settle_delay_ms times this
    pub retry_delay_multiplier: u32,
    /// Soft failures tolerated before the session aborts
    pub failure_ceiling: u32,
    /// Luma threshold for binarized OCR images
    pub binarize_threshold: u8,
    /// Gaussian blur sigma applied after binarization
    pub blur_sigma: f32,
    /// Highest normalized SSD accepted as a button match (0 is exact)
    pub template_max_score: f32,
    /// SQLite database file; defaults to `<exe_dir>/governors.db`
    pub database_path: Option<PathBuf>,
    pub layout: Layout,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            device_serial: None,
            game_package: None,
            app_start_delay_ms: 30_000,
            tesseract_path: None,
            tessdata_dir: None,
            ocr_engine_mode: EngineMode::LstmOnly,
            settle_delay_ms: 750,
            retry_delay_multiplier: 3,
            failure_ceiling: 250,
            binarize_threshold: 210,
            blur_sigma: 0.75,
            template_max_score: 0.05,
            database_path: None,
            layout: Layout::default(),
        }
    }
}

impl ScanConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn app_start_delay(&self) -> Duration {
        Duration::from_millis(self.app_start_delay_ms)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(crate::paths::get_database_path)
    }
}

/// Reads a config file, falling back to defaults when it is missing or invalid.
pub fn load_config_from(config_path: &Path) -> ScanConfig {
    info!("Looking for config at: {}", config_path.display());

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("Config loaded from {}", config_path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to parse config.json: {}. Using defaults.", e);
                }
            },
            Err(e) => {
                warn!("Failed to read config.json: {}. Using defaults.", e);
            }
        }
    } else {
        info!("config.json not found. Using default config.");
    }

    ScanConfig::default()
}

/// Loads configuration from config.json next to the executable.
fn load_config() -> ScanConfig {
    load_config_from(&crate::paths::get_exe_dir().join("config.json"))
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static ScanConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}
