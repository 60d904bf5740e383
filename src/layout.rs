//! Navigation macro table.
//!
//! Every fixed coordinate and rectangle the scanner touches lives here as
//! data, keyed by a logical name. The controller never holds raw numbers, so
//! an alternate device resolution or UI revision only needs a different
//! `Layout` (loadable from config.json).

use serde::{Deserialize, Serialize};

/// A point in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: u32,
    pub y: u32,
}

impl ScreenPoint {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in device pixels used to crop a capture before OCR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Fixed taps used by the scan sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Own governor avatar, top-left of the city view
    OpenGovernorProfile,
    OpenRankings,
    OpenIndividualPower,
    CloseMoreInfo,
    CloseGovernorProfile,
    CloseKillRankings,
    OpenKillRankings,
}

/// OCR regions on the profile, kill statistics and more-info screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Power,
    KillPoints,
    GovernorId,
    KillTiers,
    MoreInfo,
}

/// Swipe gesture between two points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
}

/// Positions of deaths and resource assistance inside the more-info panel.
///
/// Indices are 0-based over the non-empty OCR lines of the `MoreInfo`
/// region. They depend on the exact panel layout; bump `version` whenever
/// they change so stale configs are visible in logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoreInfoMapping {
    pub version: u32,
    pub deaths_line: usize,
    pub resource_assistance_line: usize,
}

impl Default for MoreInfoMapping {
    fn default() -> Self {
        Self {
            version: 1,
            deaths_line: 3,
            resource_assistance_line: 6,
        }
    }
}

/// Complete UI layout for one device resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub governor_profile_button: ScreenPoint,
    pub rankings_button: ScreenPoint,
    pub individual_power_button: ScreenPoint,
    pub more_info_close_button: ScreenPoint,
    pub governor_profile_close_button: ScreenPoint,
    pub close_kill_rankings_button: ScreenPoint,
    pub kill_rankings_button: ScreenPoint,

    /// X coordinate shared by every row of the rankings list
    pub preview_x: u32,
    /// Y coordinates of the visible rows. The list only scrolls once the
    /// last entry is reached, so every entity past the fifth reuses it.
    pub preview_y: Vec<u32>,
    /// Gesture that advances the rankings list by one row
    pub skip_swipe: Swipe,

    /// Static position of the "more info" button, used only when template
    /// matching is disabled or misses
    pub more_info_fallback: Option<ScreenPoint>,

    pub power_label: ScreenRegion,
    pub kill_points_label: ScreenRegion,
    pub governor_id_label: ScreenRegion,
    pub kill_tier_labels: ScreenRegion,
    pub more_info_labels: ScreenRegion,

    pub more_info_mapping: MoreInfoMapping,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            governor_profile_button: ScreenPoint::new(60, 50),
            rankings_button: ScreenPoint::new(510, 746),
            individual_power_button: ScreenPoint::new(424, 505),
            more_info_close_button: ScreenPoint::new(1396, 58),
            governor_profile_close_button: ScreenPoint::new(1365, 104),
            close_kill_rankings_button: ScreenPoint::new(1395, 55),
            kill_rankings_button: ScreenPoint::new(825, 525),
            preview_x: 690,
            preview_y: vec![285, 390, 490, 590, 605],
            skip_swipe: Swipe {
                from: ScreenPoint::new(690, 605),
                to: ScreenPoint::new(690, 540),
            },
            more_info_fallback: None,
            power_label: ScreenRegion::new(884, 332, 180, 44),
            kill_points_label: ScreenRegion::new(1134, 331, 222, 44),
            governor_id_label: ScreenRegion::new(733, 197, 200, 35),
            kill_tier_labels: ScreenRegion::new(861, 426, 129, 219),
            more_info_labels: ScreenRegion::new(1126, 254, 181, 527),
            more_info_mapping: MoreInfoMapping::default(),
        }
    }
}

impl Layout {
    pub fn action(&self, action: Action) -> ScreenPoint {
        match action {
            Action::OpenGovernorProfile => self.governor_profile_button,
            Action::OpenRankings => self.rankings_button,
            Action::OpenIndividualPower => self.individual_power_button,
            Action::CloseMoreInfo => self.more_info_close_button,
            Action::CloseGovernorProfile => self.governor_profile_close_button,
            Action::CloseKillRankings => self.close_kill_rankings_button,
            Action::OpenKillRankings => self.kill_rankings_button,
        }
    }

    pub fn region(&self, region: Region) -> ScreenRegion {
        match region {
            Region::Power => self.power_label,
            Region::KillPoints => self.kill_points_label,
            Region::GovernorId => self.governor_id_label,
            Region::KillTiers => self.kill_tier_labels,
            Region::MoreInfo => self.more_info_labels,
        }
    }

    /// Tap position of the rankings row for the given 0-based iteration.
    ///
    /// Clamps to the last configured row; an empty row list falls back to
    /// the first row of the default layout.
    pub fn preview_tap(&self, iteration: u32) -> ScreenPoint {
        let y = match self.preview_y.len() {
            0 => 285,
            n => self.preview_y[(iteration as usize).min(n - 1)],
        };
        ScreenPoint::new(self.preview_x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_tap_rotates_then_clamps() {
        let layout = Layout::default();
        assert_eq!(layout.preview_tap(0), ScreenPoint::new(690, 285));
        assert_eq!(layout.preview_tap(3), ScreenPoint::new(690, 590));
        assert_eq!(layout.preview_tap(4), ScreenPoint::new(690, 605));
        assert_eq!(layout.preview_tap(5), ScreenPoint::new(690, 605));
        assert_eq!(layout.preview_tap(299), ScreenPoint::new(690, 605));
    }

    #[test]
    fn test_lookup_by_name() {
        let layout = Layout::default();
        assert_eq!(layout.action(Action::CloseMoreInfo), ScreenPoint::new(1396, 58));
        assert_eq!(
            layout.region(Region::KillTiers),
            ScreenRegion::new(861, 426, 129, 219)
        );
    }

    #[test]
    fn test_partial_layout_fills_defaults() {
        let json = r#"{ "preview_x": 700, "more_info_fallback": { "x": 356, "y": 736 } }"#;
        let layout: Layout = serde_json::from_str(json).unwrap();

        assert_eq!(layout.preview_x, 700);
        assert_eq!(layout.more_info_fallback, Some(ScreenPoint::new(356, 736)));
        assert_eq!(layout.power_label, Layout::default().power_label);
        assert_eq!(layout.more_info_mapping.deaths_line, 3);
        assert_eq!(layout.more_info_mapping.resource_assistance_line, 6);
    }
}
