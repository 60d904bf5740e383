use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the scratch directory for captures: `<exe_dir>/temp/`
pub fn get_temp_dir() -> PathBuf {
    get_exe_dir().join("temp")
}

/// Returns the template image directory: `<exe_dir>/resources/stats-scan/`
pub fn get_template_dir() -> PathBuf {
    get_exe_dir().join("resources").join("stats-scan")
}

/// Returns the tesseract directory: `<exe_dir>/tesseract/`
pub fn get_tesseract_dir() -> PathBuf {
    get_exe_dir().join("tesseract")
}

/// Returns the default database file: `<exe_dir>/governors.db`
pub fn get_database_path() -> PathBuf {
    get_exe_dir().join("governors.db")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_temp_dir())?;
    std::fs::create_dir_all(get_template_dir())?;
    Ok(())
}
