//! Cross-boundary contracts shared by the decision core, API client, and runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The backend reports currency amounts in integer nano-units.
pub const NANO_UNITS_PER_COIN: f64 = 1_000_000_000.0;

/// Upgrade categories carried in profile upgrade records. The backend is free
/// to introduce new categories; those land on `Unknown` and are ignored by
/// level derivation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UpgradeKind {
    #[serde(rename = "mining-speed")]
    MiningSpeed,
    #[serde(rename = "storage-size")]
    StorageSize,
    #[serde(rename = "holy-water")]
    HolyWater,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpgradeRecord {
    pub upgrade_type: UpgradeKind,
    pub upgrade_level: u32,
}

/// Account snapshot as returned by the profile endpoint. The upgrade list has
/// no ordering or uniqueness guarantee; duplicates are normal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub last_claim: DateTime<Utc>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeRecord>,
}

/// Generic `{"data": …}` envelope wrapping every read endpoint's payload.
/// A missing or null `data` field is a meaningful "no value" state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BonusRecord {
    pub timestamp: DateTime<Utc>,
}

/// The daily-bonus endpoint answers with either a single record or a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BonusHistory {
    One(BonusRecord),
    Many(Vec<BonusRecord>),
}

impl BonusHistory {
    /// Flatten the polymorphic wire shape into a plain record list.
    pub fn into_records(self) -> Vec<BonusRecord> {
        match self {
            Self::One(record) => vec![record],
            Self::Many(records) => records,
        }
    }
}

/// Body of claim and upgrade replies. Success comes back as an empty body or
/// a body without a message; rejections carry a human-readable `message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionReply {
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionReply {
    pub fn rejection(&self) -> Option<&str> {
        self.message.as_deref().filter(|message| !message.is_empty())
    }
}

/// Tunable knobs for one account runner. Loaded from the environment by the
/// binary and passed in explicitly so decision code stays deterministic under
/// test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Claim once this percentage of the claim window has elapsed.
    pub claim_min_percent: u32,
    /// Reserved for a per-claim retry policy; recognised but not consumed.
    pub claim_retry_count: u32,
    pub upgrade_speed: bool,
    pub speed_max_level: u32,
    pub upgrade_storage: bool,
    pub storage_max_level: u32,
    /// Cycle interval when the claim window has already elapsed.
    pub default_sleep_secs: u64,
    pub use_proxy_from_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            claim_min_percent: 75,
            claim_retry_count: 3,
            upgrade_speed: true,
            speed_max_level: 7,
            upgrade_storage: true,
            storage_max_level: 7,
            default_sleep_secs: 3600,
            use_proxy_from_file: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_decodes_duplicate_and_unknown_upgrades() {
        let raw = r#"{
            "last_claim": "2024-05-01T10:00:00Z",
            "upgrades": [
                {"upgrade_type": "mining-speed", "upgrade_level": 2},
                {"upgrade_type": "mining-speed", "upgrade_level": 1},
                {"upgrade_type": "golden-shovel", "upgrade_level": 9}
            ]
        }"#;

        let profile: Profile = serde_json::from_str(raw).expect("profile decodes");
        assert_eq!(profile.upgrades.len(), 3);
        assert_eq!(profile.upgrades[0].upgrade_type, UpgradeKind::MiningSpeed);
        assert_eq!(profile.upgrades[2].upgrade_type, UpgradeKind::Unknown);
    }

    #[test]
    fn profile_without_upgrades_defaults_to_empty() {
        let raw = r#"{"last_claim": "2024-05-01T10:00:00Z"}"#;
        let profile: Profile = serde_json::from_str(raw).expect("profile decodes");
        assert!(profile.upgrades.is_empty());
    }

    #[test]
    fn envelope_tolerates_missing_and_null_data() {
        let missing: Envelope<Profile> = serde_json::from_str("{}").expect("decodes");
        assert!(missing.data.is_none());

        let null: Envelope<Profile> = serde_json::from_str(r#"{"data": null}"#).expect("decodes");
        assert!(null.data.is_none());
    }

    #[test]
    fn bonus_history_normalises_both_wire_shapes() {
        let single: BonusHistory =
            serde_json::from_str(r#"{"timestamp": "2024-05-01T10:00:00Z"}"#).expect("decodes");
        assert_eq!(single.into_records().len(), 1);

        let many: BonusHistory = serde_json::from_str(
            r#"[{"timestamp": "2024-05-01T10:00:00Z"}, {"timestamp": "2024-05-02T10:00:00Z"}]"#,
        )
        .expect("decodes");
        let records = many.into_records();
        assert_eq!(records.len(), 2);
        assert!(records[0].timestamp < records[1].timestamp);
    }

    #[test]
    fn action_reply_rejection_requires_non_empty_message() {
        let empty: ActionReply = serde_json::from_str("{}").expect("decodes");
        assert!(empty.rejection().is_none());

        let blank: ActionReply = serde_json::from_str(r#"{"message": ""}"#).expect("decodes");
        assert!(blank.rejection().is_none());

        let rejected: ActionReply =
            serde_json::from_str(r#"{"message": "insufficient balance"}"#).expect("decodes");
        assert_eq!(rejected.rejection(), Some("insufficient balance"));
    }

    #[test]
    fn settings_defaults_match_recognised_options() {
        let settings = Settings::default();
        assert_eq!(settings.claim_min_percent, 75);
        assert_eq!(settings.claim_retry_count, 3);
        assert!(settings.upgrade_speed);
        assert_eq!(settings.speed_max_level, 7);
        assert!(settings.upgrade_storage);
        assert_eq!(settings.storage_max_level, 7);
        assert_eq!(settings.default_sleep_secs, 3600);
        assert!(!settings.use_proxy_from_file);
    }
}
