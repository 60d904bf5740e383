//! Completeness check between extraction and commit.

use thiserror::Error;

use crate::record::GovernorRecord;

/// Everything read for one governor, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFields {
    pub id: String,
    pub nickname: String,
    pub power: String,
    pub kill_points: String,
    pub tier_kills: [String; 5],
    pub deaths: String,
    pub resource_assistance: String,
}

impl RawFields {
    /// Strips OCR whitespace and trailing newlines from every field.
    pub fn trimmed(self) -> Self {
        let trim = |s: String| s.trim().to_string();
        Self {
            id: trim(self.id),
            nickname: trim(self.nickname),
            power: trim(self.power),
            kill_points: trim(self.kill_points),
            tier_kills: self.tier_kills.map(trim),
            deaths: trim(self.deaths),
            resource_assistance: trim(self.resource_assistance),
        }
    }
}

/// At least one required field came back empty.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing fields: {}", missing.join(", "))]
pub struct ValidationSkip {
    pub missing: Vec<&'static str>,
}

/// Builds a record when all nine required fields are non-empty.
///
/// The five tier kill counts form one field: any empty tier makes the whole
/// group missing.
pub fn validate(raw: RawFields) -> Result<GovernorRecord, ValidationSkip> {
    let raw = raw.trimmed();

    let checks = [
        ("nickname", raw.nickname.is_empty()),
        ("power", raw.power.is_empty()),
        ("kill_points", raw.kill_points.is_empty()),
        ("governor_id", raw.id.is_empty()),
        ("deaths", raw.deaths.is_empty()),
        ("resource_assistance", raw.resource_assistance.is_empty()),
        ("tier_kills", raw.tier_kills.iter().any(|t| t.is_empty())),
    ];

    let missing: Vec<&'static str> = checks
        .iter()
        .filter(|(_, empty)| *empty)
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ValidationSkip { missing });
    }

    let [tier1_kills, tier2_kills, tier3_kills, tier4_kills, tier5_kills] = raw.tier_kills;

    Ok(GovernorRecord {
        id: raw.id,
        nickname: raw.nickname,
        power: raw.power,
        kill_points: raw.kill_points,
        tier1_kills,
        tier2_kills,
        tier3_kills,
        tier4_kills,
        tier5_kills,
        deaths: raw.deaths,
        resource_assistance: raw.resource_assistance,
    })
}
