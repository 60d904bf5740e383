//! Scan session controller.
//!
//! Drives the device through the rankings list one governor at a time:
//! open the profile, read the profile, kill statistics and more-info
//! screens, validate, commit. The failure budget is applied once per
//! iteration here rather than inside the per-entity body.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::session::{
    IterationOutcome, ScanError, ScanMode, ScanReport, ScanSession, ScanState, SoftSkipReason,
};
use super::validator::{RawFields, validate};
use crate::clipboard::Clipboard;
use crate::device::{DeviceDriver, InputCommand};
use crate::layout::{Action, Layout, ScreenPoint};
use crate::matcher::{Template, TemplateMatcher, TemplateSet};
use crate::ocr::{FieldExtractor, OcrEngine};
use crate::record::GovernorRecord;
use crate::store::GovernorStore;

/// Blocking wait between device interactions.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Everything the controller drives, exclusively borrowed for the session.
pub struct Collaborators<'a> {
    pub device: &'a mut dyn DeviceDriver,
    pub matcher: &'a dyn TemplateMatcher,
    pub ocr: &'a mut dyn OcrEngine,
    pub clipboard: &'a mut dyn Clipboard,
    pub store: &'a mut dyn GovernorStore,
    pub sleeper: &'a mut dyn Sleeper,
}

pub struct ScanController<'a> {
    pub session: ScanSession,
    pub state: ScanState,
    layout: Layout,
    extractor: FieldExtractor,
    templates: TemplateSet,
    /// Where the latest profile capture is written, for inspection
    capture_path: Option<PathBuf>,
    device: &'a mut dyn DeviceDriver,
    matcher: &'a dyn TemplateMatcher,
    ocr: &'a mut dyn OcrEngine,
    clipboard: &'a mut dyn Clipboard,
    store: &'a mut dyn GovernorStore,
    sleeper: &'a mut dyn Sleeper,
}

impl<'a> ScanController<'a> {
    pub fn new(
        session: ScanSession,
        layout: Layout,
        extractor: FieldExtractor,
        templates: TemplateSet,
        collaborators: Collaborators<'a>,
    ) -> Self {
        Self {
            session,
            state: ScanState::Initializing,
            layout,
            extractor,
            templates,
            capture_path: None,
            device: collaborators.device,
            matcher: collaborators.matcher,
            ocr: collaborators.ocr,
            clipboard: collaborators.clipboard,
            store: collaborators.store,
            sleeper: collaborators.sleeper,
        }
    }

    pub fn with_capture_path(mut self, path: PathBuf) -> Self {
        self.capture_path = Some(path);
        self
    }

    /// Runs the whole session.
    ///
    /// Returns the per-entity outcomes, or the error that ended the session.
    /// Records committed before a fatal error stay committed.
    pub fn run(&mut self) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        match self.drive(&mut report) {
            Ok(()) => {
                self.state = ScanState::Done;
                report.failure_count = self.session.failure_count;
                info!(
                    "Scan complete: {} committed, {} soft-skipped, {} validation-skipped",
                    report.committed(),
                    report.soft_skipped(),
                    report.validation_skipped()
                );
                Ok(report)
            }
            Err(e) => {
                warn!("Scan aborted during {}: {:#}", self.state, e);
                self.state = ScanState::Fatal(e.to_string());
                self.ocr.terminate();
                Err(e)
            }
        }
    }

    fn drive(&mut self, report: &mut ScanReport) -> Result<()> {
        self.state = ScanState::Initializing;
        self.initialize()?;

        for i in 0..self.session.target_count {
            self.state = ScanState::ScanningEntity(i);
            let outcome = self.scan_entity(i)?;

            match &outcome {
                IterationOutcome::Committed => {
                    info!("Entity {}/{}: committed", i + 1, self.session.target_count);
                }
                IterationOutcome::SoftSkipped(reason) => {
                    warn!(
                        "Entity {}/{}: skipped ({:?}), failures {}",
                        i + 1,
                        self.session.target_count,
                        reason,
                        self.session.failure_count + 1
                    );
                }
                IterationOutcome::ValidationSkipped(missing) => {
                    info!(
                        "Entity {}/{}: dropped, missing {}",
                        i + 1,
                        self.session.target_count,
                        missing.join(", ")
                    );
                }
            }

            let soft_failed = matches!(outcome, IterationOutcome::SoftSkipped(_));
            report.outcomes.push(outcome);
            if soft_failed {
                self.session.record_soft_failure()?;
            }
        }

        self.state = ScanState::Finalizing;
        self.finalize()
    }

    fn initialize(&mut self) -> Result<()> {
        if let Some(package) = self.session.game_package.clone() {
            self.device.restart_app(&package)?;
            self.sleeper.sleep(self.session.app_start_delay);
        }

        info!("Deleting old data");
        self.store.delete_all()?;

        self.tap_action(Action::OpenGovernorProfile)?;
        self.tap_action(Action::OpenRankings)?;
        self.tap_action(Action::OpenIndividualPower)?;

        self.ocr.configure(self.extractor.single_line_options())
    }

    fn finalize(&mut self) -> Result<()> {
        self.tap_action(Action::CloseKillRankings)?;
        self.tap_action(Action::OpenKillRankings)?;
        self.ocr.terminate();
        Ok(())
    }

    /// Scans the governor at rankings row `i`.
    ///
    /// Never touches the failure counter; the caller does that based on the
    /// returned outcome.
    pub fn scan_entity(&mut self, i: u32) -> Result<IterationOutcome> {
        self.tap(self.layout.preview_tap(i))?;
        let mut profile = self.capture_profile()?;

        let Some(more_info) = self
            .locate(&profile, Template::MoreInfoButton)
            .or(self.layout.more_info_fallback)
        else {
            self.skip_to_next()?;
            return Ok(IterationOutcome::SoftSkipped(SoftSkipReason::MoreInfoNotFound));
        };
        debug!("More info button: {:?}", more_info);

        self.clipboard.write("")?;

        let copy_nickname = match self.locate(&profile, Template::CopyNicknameButton) {
            Some(point) => Some(point),
            None => {
                let delay = self.session.retry_delay();
                info!("Copy nickname button not found, retrying after {:?}", delay);
                self.sleeper.sleep(delay);
                profile = self.capture_profile()?;
                self.locate(&profile, Template::CopyNicknameButton)
            }
        };
        let Some(copy_nickname) = copy_nickname else {
            self.skip_to_next()?;
            return Ok(IterationOutcome::SoftSkipped(
                SoftSkipReason::CopyNicknameNotFound,
            ));
        };

        self.tap(copy_nickname)?;
        let nickname = self.clipboard.read()?;

        let profile_fields = self.extractor.extract_profile(&mut *self.ocr, &profile)?;

        let kill_statistics = self
            .locate(&profile, Template::KillStatisticsButton)
            .ok_or(ScanError::KillStatisticsNotFound { entity: i + 1 })?;

        self.tap(kill_statistics)?;
        let kill_screen = self.device.capture_screen()?;
        let tier_kills = self
            .extractor
            .extract_tier_kills(&mut *self.ocr, &kill_screen)?;

        self.tap(more_info)?;
        let more_info_screen = self.device.capture_screen()?;
        let more_info_fields = self
            .extractor
            .extract_more_info(&mut *self.ocr, &more_info_screen)?;

        self.tap_action(Action::CloseMoreInfo)?;
        self.tap_action(Action::CloseGovernorProfile)?;

        let raw = RawFields {
            id: profile_fields.governor_id,
            nickname,
            power: profile_fields.power,
            kill_points: profile_fields.kill_points,
            tier_kills,
            deaths: more_info_fields.deaths,
            resource_assistance: more_info_fields.resource_assistance,
        };
        debug!("Raw fields: {:?}", raw);

        match validate(raw) {
            Ok(record) => {
                self.commit(&record)?;
                Ok(IterationOutcome::Committed)
            }
            Err(skip) => Ok(IterationOutcome::ValidationSkipped(skip.missing)),
        }
    }

    fn commit(&mut self, record: &GovernorRecord) -> Result<()> {
        info!(
            "Governor {} ({}): power {}, kill points {}",
            record.id, record.nickname, record.power, record.kill_points
        );
        match self.session.mode {
            ScanMode::Continuing => self.store.update(record),
            ScanMode::NewEpoch => self
                .store
                .insert_or_update(record, self.session.reset_flags()),
        }
    }

    fn locate(&self, haystack: &RgbaImage, template: Template) -> Option<ScreenPoint> {
        self.matcher.locate(haystack, self.templates.get(template))
    }

    fn capture_profile(&mut self) -> Result<RgbaImage> {
        let img = self.device.capture_screen()?;
        if let Some(path) = &self.capture_path {
            img.save(path)
                .with_context(|| format!("Failed to save capture to {}", path.display()))?;
        }
        Ok(img)
    }

    fn skip_to_next(&mut self) -> Result<()> {
        self.input(InputCommand::Swipe(self.layout.skip_swipe))
    }

    fn tap_action(&mut self, action: Action) -> Result<()> {
        debug!("Tap {:?}", action);
        self.tap(self.layout.action(action))
    }

    fn tap(&mut self, point: ScreenPoint) -> Result<()> {
        self.input(InputCommand::Tap(point))
    }

    /// Every interaction is followed by the settle delay.
    fn input(&mut self, command: InputCommand) -> Result<()> {
        self.device.issue_input(&command)?;
        self.sleeper.sleep(self.session.settle_delay);
        Ok(())
    }
}
