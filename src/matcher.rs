//! Template matching for buttons whose position moves between profiles.

use anyhow::{Context, Result};
use image::{RgbaImage, imageops};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};
use std::path::Path;
use tracing::debug;

use crate::layout::ScreenPoint;

/// Reference button images under `resources/stats-scan/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Template {
    MoreInfoButton,
    CopyNicknameButton,
    KillStatisticsButton,
}

impl Template {
    pub fn file_name(&self) -> &'static str {
        match self {
            Template::MoreInfoButton => "more-info-button.png",
            Template::CopyNicknameButton => "copy-nickname-button.png",
            Template::KillStatisticsButton => "kill-statistics-button.png",
        }
    }
}

/// Loaded reference images for every button the scan looks up.
#[derive(Clone, Debug)]
pub struct TemplateSet {
    pub more_info: RgbaImage,
    pub copy_nickname: RgbaImage,
    pub kill_statistics: RgbaImage,
}

impl TemplateSet {
    pub fn load(dir: &Path) -> Result<Self> {
        let load = |template: Template| -> Result<RgbaImage> {
            let path = dir.join(template.file_name());
            let img = image::open(&path)
                .with_context(|| format!("Failed to load template {}", path.display()))?;
            Ok(img.to_rgba8())
        };

        Ok(Self {
            more_info: load(Template::MoreInfoButton)?,
            copy_nickname: load(Template::CopyNicknameButton)?,
            kill_statistics: load(Template::KillStatisticsButton)?,
        })
    }

    pub fn get(&self, template: Template) -> &RgbaImage {
        match template {
            Template::MoreInfoButton => &self.more_info,
            Template::CopyNicknameButton => &self.copy_nickname,
            Template::KillStatisticsButton => &self.kill_statistics,
        }
    }
}

/// Locates a needle image inside a capture.
pub trait TemplateMatcher {
    /// Returns the centre of the best match, in capture pixels, or None when
    /// nothing is close enough.
    fn locate(&self, haystack: &RgbaImage, needle: &RgbaImage) -> Option<ScreenPoint>;
}

/// Scores every window of the grayscale capture by normalized sum of
/// squared differences and keeps the lowest.
#[derive(Clone, Debug)]
pub struct GrayTemplateMatcher {
    /// Highest normalized SSD still accepted as a match (0 is exact)
    pub max_score: f32,
}

impl GrayTemplateMatcher {
    pub fn new(max_score: f32) -> Self {
        Self { max_score }
    }
}

impl TemplateMatcher for GrayTemplateMatcher {
    fn locate(&self, haystack: &RgbaImage, needle: &RgbaImage) -> Option<ScreenPoint> {
        let (tpl_w, tpl_h) = needle.dimensions();
        let (scr_w, scr_h) = haystack.dimensions();

        if tpl_w == 0 || tpl_h == 0 || tpl_w > scr_w || tpl_h > scr_h {
            return None;
        }

        let image = imageops::grayscale(haystack);
        let template = imageops::grayscale(needle);
        let scores = match_template(
            &image,
            &template,
            MatchTemplateMethod::SumOfSquaredErrorsNormalized,
        );
        let extremes = find_extremes(&scores);
        let (x, y) = extremes.min_value_location;
        debug!(
            "Best template window at ({}, {}), score {:.4}",
            x, y, extremes.min_value
        );

        // NaN scores (all-black windows) never pass
        if extremes.min_value <= self.max_score {
            Some(ScreenPoint::new(x + tpl_w / 2, y + tpl_h / 2))
        } else {
            None
        }
    }
}
