//! Scan session configuration, run state and per-entity outcomes.

use std::time::Duration;
use thiserror::Error;

use crate::config::ScanConfig;
use crate::record::ResetFlags;

/// Whether the scan continues the current epoch or starts a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanMode {
    /// Update governors that already have a baseline
    Continuing,
    /// Insert or update governors, optionally resetting their baseline
    NewEpoch,
}

/// Conditions that end a session immediately.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("Could not locate the kill statistics button (entity {entity})")]
    KillStatisticsNotFound { entity: u32 },
    #[error("Failed to open governor profile {failures} times (ceiling {ceiling})")]
    FailureCeilingExceeded { failures: u32, ceiling: u32 },
}

/// Configuration and mutable state for one scan invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanSession {
    pub target_count: u32,
    pub mode: ScanMode,
    /// Only meaningful for `ScanMode::NewEpoch`
    pub reset_power: bool,
    /// Only meaningful for `ScanMode::NewEpoch`
    pub reset_kp: bool,
    /// Navigation soft failures so far
    pub failure_count: u32,
    pub failure_ceiling: u32,
    pub settle_delay: Duration,
    pub retry_delay_multiplier: u32,
    /// Game restarted before navigation starts, if any
    pub game_package: Option<String>,
    pub app_start_delay: Duration,
}

impl ScanSession {
    pub fn new(target_count: u32, mode: ScanMode, config: &ScanConfig) -> Self {
        Self {
            target_count,
            mode,
            reset_power: false,
            reset_kp: false,
            failure_count: 0,
            failure_ceiling: config.failure_ceiling,
            settle_delay: config.settle_delay(),
            retry_delay_multiplier: config.retry_delay_multiplier,
            game_package: config.game_package.clone(),
            app_start_delay: config.app_start_delay(),
        }
    }

    pub fn with_resets(mut self, reset_power: bool, reset_kp: bool) -> Self {
        self.reset_power = reset_power;
        self.reset_kp = reset_kp;
        self
    }

    pub fn reset_flags(&self) -> ResetFlags {
        ResetFlags {
            reset_power: self.reset_power,
            reset_kp: self.reset_kp,
        }
    }

    /// Extended wait before the single copy-nickname retry.
    pub fn retry_delay(&self) -> Duration {
        self.settle_delay * self.retry_delay_multiplier
    }

    /// Counts one navigation soft failure.
    ///
    /// Errors as soon as the count exceeds the ceiling, so a session never
    /// runs more than one failure past it.
    pub fn record_soft_failure(&mut self) -> Result<(), ScanError> {
        self.failure_count += 1;
        if self.failure_count > self.failure_ceiling {
            return Err(ScanError::FailureCeilingExceeded {
                failures: self.failure_count,
                ceiling: self.failure_ceiling,
            });
        }
        Ok(())
    }
}

/// Controller lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Initializing,
    /// 0-based entity index
    ScanningEntity(u32),
    Finalizing,
    Done,
    Fatal(String),
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Initializing => write!(f, "Initializing"),
            ScanState::ScanningEntity(i) => write!(f, "Scanning entity {}", i + 1),
            ScanState::Finalizing => write!(f, "Finalizing"),
            ScanState::Done => write!(f, "Done"),
            ScanState::Fatal(msg) => write!(f, "Fatal: {}", msg),
        }
    }
}

/// Why an entity was skipped before extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoftSkipReason {
    MoreInfoNotFound,
    CopyNicknameNotFound,
}

/// Result of scanning one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IterationOutcome {
    Committed,
    /// Navigation miss; counts against the failure ceiling
    SoftSkipped(SoftSkipReason),
    /// OCR left required fields empty; silently dropped
    ValidationSkipped(Vec<&'static str>),
}

/// Summary of a completed session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanReport {
    pub outcomes: Vec<IterationOutcome>,
    pub failure_count: u32,
}

impl ScanReport {
    pub fn committed(&self) -> usize {
        self.count(|o| matches!(o, IterationOutcome::Committed))
    }

    pub fn soft_skipped(&self) -> usize {
        self.count(|o| matches!(o, IterationOutcome::SoftSkipped(_)))
    }

    pub fn validation_skipped(&self) -> usize {
        self.count(|o| matches!(o, IterationOutcome::ValidationSkipped(_)))
    }

    fn count(&self, pred: impl Fn(&IterationOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(ceiling: u32) -> ScanSession {
        let config = ScanConfig {
            failure_ceiling: ceiling,
            ..ScanConfig::default()
        };
        ScanSession::new(10, ScanMode::Continuing, &config)
    }

    #[test]
    fn test_soft_failure_increments_by_one() {
        let mut session = session(250);
        session.record_soft_failure().unwrap();
        assert_eq!(session.failure_count, 1);
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        let mut session = session(2);
        assert!(session.record_soft_failure().is_ok());
        assert!(session.record_soft_failure().is_ok());
        assert_eq!(
            session.record_soft_failure(),
            Err(ScanError::FailureCeilingExceeded {
                failures: 3,
                ceiling: 2
            })
        );
    }

    #[test]
    fn test_retry_delay_uses_multiplier() {
        let session = session(250);
        assert_eq!(session.settle_delay, Duration::from_millis(750));
        assert_eq!(session.retry_delay(), Duration::from_millis(2250));
    }

    #[test]
    fn test_reset_flags_pass_through() {
        let session = session(250).with_resets(true, false);
        assert_eq!(
            session.reset_flags(),
            ResetFlags {
                reset_power: true,
                reset_kp: false
            }
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", ScanState::ScanningEntity(0)), "Scanning entity 1");
        assert_eq!(
            format!("{}", ScanState::Fatal("test".to_string())),
            "Fatal: test"
        );
    }

    #[test]
    fn test_report_counts() {
        let report = ScanReport {
            outcomes: vec![
                IterationOutcome::Committed,
                IterationOutcome::SoftSkipped(SoftSkipReason::MoreInfoNotFound),
                IterationOutcome::ValidationSkipped(vec!["deaths"]),
                IterationOutcome::Committed,
            ],
            failure_count: 1,
        };
        assert_eq!(report.committed(), 2);
        assert_eq!(report.soft_skipped(), 1);
        assert_eq!(report.validation_skipped(), 1);
    }
}
