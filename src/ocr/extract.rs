//! Field extraction from captured screens.
//!
//! Each operation picks the preprocessing variant and recognition mode its
//! screen needs, configures the engine explicitly, and returns the raw OCR
//! text. Trimming and validation happen in the caller.

use anyhow::Result;
use image::RgbaImage;
use tracing::debug;

use super::engine::{EngineMode, OcrEngine, OcrOptions};
use super::preprocess::{binarize_and_blur, to_grayscale};
use crate::layout::{Layout, MoreInfoMapping, Region, ScreenRegion};

/// Raw text read from the governor profile screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub power: String,
    pub kill_points: String,
    pub governor_id: String,
}

/// Raw text read from the more-info panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoreInfoFields {
    pub deaths: String,
    pub resource_assistance: String,
}

/// Region and preprocessing settings shared by every extraction.
#[derive(Clone, Debug)]
pub struct FieldExtractor {
    power: ScreenRegion,
    kill_points: ScreenRegion,
    governor_id: ScreenRegion,
    kill_tiers: ScreenRegion,
    more_info: ScreenRegion,
    mapping: MoreInfoMapping,
    threshold: u8,
    blur_sigma: f32,
    engine_mode: EngineMode,
}

impl FieldExtractor {
    pub fn new(
        layout: &Layout,
        threshold: u8,
        blur_sigma: f32,
        engine_mode: EngineMode,
    ) -> Self {
        Self {
            power: layout.region(Region::Power),
            kill_points: layout.region(Region::KillPoints),
            governor_id: layout.region(Region::GovernorId),
            kill_tiers: layout.region(Region::KillTiers),
            more_info: layout.region(Region::MoreInfo),
            mapping: layout.more_info_mapping.clone(),
            threshold,
            blur_sigma,
            engine_mode,
        }
    }

    pub fn single_line_options(&self) -> OcrOptions {
        OcrOptions::digits_single_line().with_engine_mode(self.engine_mode)
    }

    pub fn block_options(&self) -> OcrOptions {
        OcrOptions::digits_block().with_engine_mode(self.engine_mode)
    }

    /// Reads power and kill points from the binarized profile, and the
    /// governor id from its grayscale variant.
    pub fn extract_profile(
        &self,
        engine: &mut dyn OcrEngine,
        profile: &RgbaImage,
    ) -> Result<ProfileFields> {
        engine.configure(self.single_line_options())?;

        let binarized = binarize_and_blur(profile, self.threshold, self.blur_sigma);
        let power = engine.recognize(&binarized, self.power)?;
        let kill_points = engine.recognize(&binarized, self.kill_points)?;

        let grayscale = to_grayscale(profile);
        let governor_id = engine.recognize(&grayscale, self.governor_id)?;

        Ok(ProfileFields {
            power,
            kill_points,
            governor_id,
        })
    }

    /// Reads the five tier kill counts as one block, top line is tier 1.
    ///
    /// Tiers without a matching line come back empty.
    pub fn extract_tier_kills(
        &self,
        engine: &mut dyn OcrEngine,
        kill_statistics: &RgbaImage,
    ) -> Result<[String; 5]> {
        engine.configure(self.block_options())?;

        let binarized = binarize_and_blur(kill_statistics, self.threshold, self.blur_sigma);
        let text = engine.recognize(&binarized, self.kill_tiers)?;
        let lines = split_lines(&text);
        debug!("Tier kill lines: {:?}", lines);

        Ok(std::array::from_fn(|tier| {
            lines.get(tier).map(|l| l.to_string()).unwrap_or_default()
        }))
    }

    /// Reads the more-info panel and picks deaths and resource assistance by
    /// their line position.
    pub fn extract_more_info(
        &self,
        engine: &mut dyn OcrEngine,
        more_info: &RgbaImage,
    ) -> Result<MoreInfoFields> {
        engine.configure(self.block_options())?;

        let grayscale = to_grayscale(more_info);
        let text = engine.recognize(&grayscale, self.more_info)?;
        let lines = split_lines(&text);
        debug!(
            "More info lines (mapping v{}): {:?}",
            self.mapping.version, lines
        );

        let pick = |index: usize| lines.get(index).map(|l| l.to_string()).unwrap_or_default();

        Ok(MoreInfoFields {
            deaths: pick(self.mapping.deaths_line),
            resource_assistance: pick(self.mapping.resource_assistance_line),
        })
    }
}

/// Splits OCR output into lines, dropping empty ones.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|line| !line.is_empty()).collect()
}
