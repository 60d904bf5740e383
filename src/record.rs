/// One scanned governor. Numeric stats stay as the OCR text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GovernorRecord {
    pub id: String,
    pub nickname: String,
    pub power: String,
    pub kill_points: String,
    pub tier1_kills: String,
    pub tier2_kills: String,
    pub tier3_kills: String,
    pub tier4_kills: String,
    pub tier5_kills: String,
    pub deaths: String,
    pub resource_assistance: String,
}

impl GovernorRecord {
    pub fn tier_kills(&self) -> [&str; 5] {
        [
            &self.tier1_kills,
            &self.tier2_kills,
            &self.tier3_kills,
            &self.tier4_kills,
            &self.tier5_kills,
        ]
    }
}

/// Baseline resets applied when a governor already exists at the start of
/// a new epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResetFlags {
    pub reset_power: bool,
    pub reset_kp: bool,
}

/// Power and kill points recorded when the governor's epoch started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Baseline {
    pub power: String,
    pub kill_points: String,
}

/// A snapshot row joined with its epoch baseline, if one exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredGovernor {
    pub record: GovernorRecord,
    pub baseline: Option<Baseline>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_carries_fields_for_logging() {
        let record = GovernorRecord {
            id: "12345".to_string(),
            nickname: "Alice".to_string(),
            ..GovernorRecord::default()
        };
        let logged = format!("{:?}", record);
        assert!(logged.contains("id: \"12345\""));
        assert!(logged.contains("nickname: \"Alice\""));
    }

    #[test]
    fn test_tier_kills_in_order() {
        let record = GovernorRecord {
            tier1_kills: "1".to_string(),
            tier5_kills: "5".to_string(),
            ..GovernorRecord::default()
        };
        assert_eq!(record.tier_kills(), ["1", "", "", "", "5"]);
    }
}
