use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

#[cfg(windows)]
const TESSERACT_EXE: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_EXE: &str = "tesseract";

const ENG_TRAINEDDATA: &str = "eng.traineddata";

#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// None lets Tesseract use its compiled-in data directory
    pub tessdata: Option<PathBuf>,
}

/// Per-user directory for a private Tesseract install
pub fn get_user_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("governor-scan")
        .join("tesseract")
}

/// Locates Tesseract and its language data.
///
/// Explicit paths from config win; otherwise the bundled directory next to
/// the executable, the per-user directory, and finally the system PATH are
/// tried in that order.
pub fn ensure_tesseract(
    configured_exe: Option<&Path>,
    configured_tessdata: Option<&Path>,
) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(configured_exe)?;
    let tessdata = find_tessdata_dir(configured_tessdata);

    info!(
        "Tesseract: {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable, checking local dirs first, then system
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured Tesseract not found: {}",
            path.display()
        ));
    }

    for dir in [crate::paths::get_tesseract_dir(), get_user_tesseract_dir()] {
        let local_exe = dir.join(TESSERACT_EXE);
        if local_exe.exists() {
            return Ok(local_exe);
        }
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR, add it to PATH, or copy it to {}",
        crate::paths::get_tesseract_dir().display()
    ))
}

/// Finds a tessdata directory containing eng.traineddata
pub fn find_tessdata_dir(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }

    for dir in [crate::paths::get_tesseract_dir(), get_user_tesseract_dir()] {
        let local_tessdata = dir.join("tessdata");
        if local_tessdata.join(ENG_TRAINEDDATA).exists() {
            return Some(local_tessdata);
        }
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(ENG_TRAINEDDATA).exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join(ENG_TRAINEDDATA).exists() {
            return Some(p);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_configured_executable_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope").join(TESSERACT_EXE);
        assert!(find_tesseract_executable(Some(&missing)).is_err());

        let present = dir.path().join(TESSERACT_EXE);
        std::fs::write(&present, b"").unwrap();
        assert_eq!(find_tesseract_executable(Some(&present)).unwrap(), present);
    }

    #[test]
    fn test_configured_tessdata_wins() {
        let dir = tempdir().unwrap();
        assert_eq!(
            find_tessdata_dir(Some(dir.path())),
            Some(dir.path().to_path_buf())
        );
    }
}
