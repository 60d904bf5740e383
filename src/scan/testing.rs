//! Scripted collaborators for controller tests.

use anyhow::{Result, anyhow};
use image::{GrayImage, RgbaImage};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::controller::Sleeper;
use crate::clipboard::Clipboard;
use crate::device::{DeviceDriver, InputCommand};
use crate::layout::{Layout, ScreenPoint, ScreenRegion};
use crate::matcher::{Template, TemplateMatcher, TemplateSet};
use crate::ocr::{OcrEngine, OcrOptions};
use crate::record::{GovernorRecord, ResetFlags, StoredGovernor};
use crate::store::GovernorStore;

pub const MORE_INFO_POINT: ScreenPoint = ScreenPoint::new(356, 736);
pub const COPY_NICKNAME_POINT: ScreenPoint = ScreenPoint::new(700, 150);
pub const KILL_STATISTICS_POINT: ScreenPoint = ScreenPoint::new(1110, 450);

/// Templates told apart by their width.
pub fn templates() -> TemplateSet {
    TemplateSet {
        more_info: RgbaImage::new(2, 1),
        copy_nickname: RgbaImage::new(3, 1),
        kill_statistics: RgbaImage::new(4, 1),
    }
}

fn template_of(needle: &RgbaImage) -> Template {
    match needle.width() {
        2 => Template::MoreInfoButton,
        3 => Template::CopyNicknameButton,
        _ => Template::KillStatisticsButton,
    }
}

#[derive(Default)]
pub struct MockDevice {
    pub inputs: Vec<InputCommand>,
    pub captures: usize,
    /// Restarted package and the number of inputs issued before it
    pub restarts: Vec<(String, usize)>,
}

impl MockDevice {
    pub fn taps(&self) -> Vec<ScreenPoint> {
        self.inputs
            .iter()
            .filter_map(|c| match c {
                InputCommand::Tap(p) => Some(*p),
                InputCommand::Swipe(_) => None,
            })
            .collect()
    }

    pub fn swipes(&self) -> usize {
        self.inputs
            .iter()
            .filter(|c| matches!(c, InputCommand::Swipe(_)))
            .count()
    }
}

impl DeviceDriver for MockDevice {
    fn issue_input(&mut self, command: &InputCommand) -> Result<()> {
        self.inputs.push(*command);
        Ok(())
    }

    fn capture_screen(&mut self) -> Result<RgbaImage> {
        self.captures += 1;
        Ok(RgbaImage::new(8, 8))
    }

    fn restart_app(&mut self, package: &str) -> Result<()> {
        self.restarts.push((package.to_string(), self.inputs.len()));
        Ok(())
    }
}

/// Finds every template except on the listed 0-based lookup numbers.
#[derive(Default)]
pub struct ScriptedMatcher {
    pub misses: HashMap<Template, HashSet<usize>>,
    /// When set, every lookup of the template misses
    pub always_miss: HashSet<Template>,
    calls: RefCell<HashMap<Template, usize>>,
}

impl ScriptedMatcher {
    pub fn miss(mut self, template: Template, lookup: usize) -> Self {
        self.misses.entry(template).or_default().insert(lookup);
        self
    }

    pub fn never_find(mut self, template: Template) -> Self {
        self.always_miss.insert(template);
        self
    }

    pub fn lookups(&self, template: Template) -> usize {
        self.calls.borrow().get(&template).copied().unwrap_or(0)
    }
}

impl TemplateMatcher for ScriptedMatcher {
    fn locate(&self, _haystack: &RgbaImage, needle: &RgbaImage) -> Option<ScreenPoint> {
        let template = template_of(needle);
        let mut calls = self.calls.borrow_mut();
        let call = calls.entry(template).or_insert(0);
        let lookup = *call;
        *call += 1;

        let missed = self.always_miss.contains(&template)
            || self
                .misses
                .get(&template)
                .is_some_and(|set| set.contains(&lookup));
        if missed {
            return None;
        }

        Some(match template {
            Template::MoreInfoButton => MORE_INFO_POINT,
            Template::CopyNicknameButton => COPY_NICKNAME_POINT,
            Template::KillStatisticsButton => KILL_STATISTICS_POINT,
        })
    }
}

/// Answers each region with fixed text, optionally overridden for one
/// 0-based recognize call on that region.
pub struct ScriptedOcr {
    texts: HashMap<ScreenRegion, String>,
    overrides: HashMap<(ScreenRegion, usize), String>,
    calls: HashMap<ScreenRegion, usize>,
    pub configured: Vec<OcrOptions>,
    pub terminated: bool,
}

impl ScriptedOcr {
    /// OCR output for the canonical governor (id 12345, "Alice").
    pub fn canonical(layout: &Layout) -> Self {
        let texts = [
            (layout.power_label, " 5000000\n"),
            (layout.kill_points_label, "9000000\n"),
            (layout.governor_id_label, "12345 \n"),
            (layout.kill_tier_labels, "100\n200\n300\n400\n500\n"),
            (
                layout.more_info_labels,
                "120\n80\n40\n7\n15\n2\n3000000\n9\n",
            ),
        ]
        .into_iter()
        .map(|(region, text)| (region, text.to_string()))
        .collect();

        Self {
            texts,
            overrides: HashMap::new(),
            calls: HashMap::new(),
            configured: Vec::new(),
            terminated: false,
        }
    }

    pub fn with_override(mut self, region: ScreenRegion, call: usize, text: &str) -> Self {
        self.overrides.insert((region, call), text.to_string());
        self
    }
}

impl OcrEngine for ScriptedOcr {
    fn configure(&mut self, options: OcrOptions) -> Result<()> {
        self.configured.push(options);
        Ok(())
    }

    fn recognize(&mut self, _image: &GrayImage, region: ScreenRegion) -> Result<String> {
        if self.terminated {
            return Err(anyhow!("OCR engine already terminated"));
        }
        let call = self.calls.entry(region).or_insert(0);
        let index = *call;
        *call += 1;

        if let Some(text) = self.overrides.get(&(region, index)) {
            return Ok(text.clone());
        }
        Ok(self.texts.get(&region).cloned().unwrap_or_default())
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}

pub struct MockClipboard {
    pub nickname: String,
    pub writes: Vec<String>,
}

impl MockClipboard {
    pub fn new(nickname: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            writes: Vec::new(),
        }
    }
}

impl Clipboard for MockClipboard {
    fn write(&mut self, text: &str) -> Result<()> {
        self.writes.push(text.to_string());
        Ok(())
    }

    fn read(&mut self) -> Result<String> {
        Ok(self.nickname.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    DeleteAll,
    Update(GovernorRecord),
    InsertOrUpdate(GovernorRecord, ResetFlags),
}

#[derive(Default)]
pub struct MockStore {
    pub calls: Vec<StoreCall>,
    /// Makes `update` fail like an unknown governor id
    pub reject_updates: bool,
}

impl MockStore {
    pub fn commits(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| !matches!(c, StoreCall::DeleteAll))
            .count()
    }
}

impl GovernorStore for MockStore {
    fn delete_all(&mut self) -> Result<()> {
        self.calls.push(StoreCall::DeleteAll);
        Ok(())
    }

    fn update(&mut self, record: &GovernorRecord) -> Result<()> {
        if self.reject_updates {
            return Err(anyhow!("Governor {} not found", record.id));
        }
        self.calls.push(StoreCall::Update(record.clone()));
        Ok(())
    }

    fn insert_or_update(&mut self, record: &GovernorRecord, flags: ResetFlags) -> Result<()> {
        self.calls
            .push(StoreCall::InsertOrUpdate(record.clone(), flags));
        Ok(())
    }

    fn list_by_power_desc(&mut self) -> Result<Vec<StoredGovernor>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
