use anyhow::{Context, Result, anyhow};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

use super::preprocess::crop_region;
use super::setup::TesseractPaths;
use crate::layout::ScreenRegion;

/// Tesseract `--oem` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    LegacyOnly = 0,
    LstmOnly = 1,
    Combined = 2,
    Default = 3,
}

/// Tesseract `--psm` values used by the scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentationMode {
    /// Assume a single uniform block of text
    SingleBlock = 6,
    /// Treat the image as a single text line
    SingleLine = 7,
}

/// Recognition settings applied to every following `recognize` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrOptions {
    pub engine_mode: EngineMode,
    pub char_whitelist: Option<String>,
    pub segmentation_mode: SegmentationMode,
}

const DIGITS: &str = "0123456789";

impl OcrOptions {
    /// Single number on one line: power, kill points, governor id.
    pub fn digits_single_line() -> Self {
        Self {
            engine_mode: EngineMode::LstmOnly,
            char_whitelist: Some(DIGITS.to_string()),
            segmentation_mode: SegmentationMode::SingleLine,
        }
    }

    /// Column of numbers: kill tiers and the more-info panel.
    pub fn digits_block() -> Self {
        Self {
            segmentation_mode: SegmentationMode::SingleBlock,
            ..Self::digits_single_line()
        }
    }

    pub fn with_engine_mode(self, engine_mode: EngineMode) -> Self {
        Self {
            engine_mode,
            ..self
        }
    }
}

/// Text recognition over a region of a preprocessed capture.
///
/// Options are sticky: `configure` must be called before any recognize
/// that needs a different mode. "No text found" is an empty string, never
/// an error.
pub trait OcrEngine {
    fn configure(&mut self, options: OcrOptions) -> Result<()>;
    fn recognize(&mut self, image: &GrayImage, region: ScreenRegion) -> Result<String>;
    /// Releases engine resources. Further recognize calls fail.
    fn terminate(&mut self);
}

/// Runs the Tesseract CLI once per recognize call.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    options: OcrOptions,
    workdir: Option<TempDir>,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("governor-scan-ocr")
            .tempdir()
            .context("Failed to create OCR working directory")?;

        Ok(Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            options: OcrOptions::digits_single_line(),
            workdir: Some(workdir),
        })
    }

    fn build_command(&self, input: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata);
        }
        cmd.arg("-l")
            .arg("eng")
            .arg("--oem")
            .arg((self.options.engine_mode as u8).to_string())
            .arg("--psm")
            .arg((self.options.segmentation_mode as u8).to_string());
        if let Some(whitelist) = &self.options.char_whitelist {
            cmd.arg("-c")
                .arg(format!("tessedit_char_whitelist={}", whitelist));
        }
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    fn configure(&mut self, options: OcrOptions) -> Result<()> {
        debug!("OCR configure: {:?}", options);
        self.options = options;
        Ok(())
    }

    fn recognize(&mut self, image: &GrayImage, region: ScreenRegion) -> Result<String> {
        let workdir = self
            .workdir
            .as_ref()
            .ok_or_else(|| anyhow!("OCR engine already terminated"))?;

        let cropped = crop_region(image, &region);
        if cropped.width() == 0 || cropped.height() == 0 {
            return Ok(String::new());
        }

        let input = workdir.path().join("region.png");
        cropped
            .save(&input)
            .context("Failed to write OCR input image")?;

        let output = self
            .build_command(&input)
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("OCR {:?}: {:?}", region, text);
        Ok(text)
    }

    fn terminate(&mut self) {
        // Dropping the TempDir removes the working files
        self.workdir = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TesseractEngine {
        let paths = TesseractPaths {
            executable: PathBuf::from("tesseract"),
            tessdata: Some(PathBuf::from("/opt/tessdata")),
        };
        TesseractEngine::new(paths).unwrap()
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_block_preset_only_changes_segmentation() {
        let line = OcrOptions::digits_single_line();
        let block = OcrOptions::digits_block();
        assert_eq!(block.segmentation_mode, SegmentationMode::SingleBlock);
        assert_eq!(block.char_whitelist, line.char_whitelist);
        assert_eq!(block.engine_mode, EngineMode::LstmOnly);
    }

    #[test]
    fn test_command_reflects_configured_options() {
        let mut engine = engine();
        let input = PathBuf::from("region.png");

        let single = args(&engine.build_command(&input));
        assert!(single.windows(2).any(|w| w == ["--psm", "7"]));
        assert!(single.windows(2).any(|w| w == ["--oem", "1"]));
        assert!(single.windows(2).any(|w| w == ["--tessdata-dir", "/opt/tessdata"]));
        assert!(single.contains(&"tessedit_char_whitelist=0123456789".to_string()));

        engine
            .configure(OcrOptions::digits_block().with_engine_mode(EngineMode::Default))
            .unwrap();
        let block = args(&engine.build_command(&input));
        assert!(block.windows(2).any(|w| w == ["--psm", "6"]));
        assert!(block.windows(2).any(|w| w == ["--oem", "3"]));
    }

    #[test]
    fn test_recognize_after_terminate_fails() {
        let mut engine = engine();
        engine.terminate();
        let img = GrayImage::new(10, 10);
        assert!(engine.recognize(&img, ScreenRegion::new(0, 0, 5, 5)).is_err());
    }

    #[test]
    fn test_empty_region_is_empty_text() {
        let mut engine = engine();
        let img = GrayImage::new(10, 10);
        let text = engine
            .recognize(&img, ScreenRegion::new(50, 50, 5, 5))
            .unwrap();
        assert_eq!(text, "");
    }
}
