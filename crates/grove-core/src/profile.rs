//! Interpretation of raw profile snapshots: level derivation and claim-window
//! arithmetic.

use chrono::{DateTime, Duration, Utc};
use contracts::{Profile, UpgradeKind};

use crate::levels;

/// Highest level seen per upgrade kind across a profile's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedLevels {
    pub speed: u32,
    pub storage: u32,
    pub holy: u32,
}

/// Claim timing derived from a profile snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimWindow {
    pub window_hours: u64,
    /// Absent when no profile is available.
    pub next_claim_at: Option<DateTime<Utc>>,
}

/// Fold the upgrade records into per-kind maxima. The record list carries no
/// ordering or uniqueness guarantee, so a running maximum (ties keep the
/// existing value via `>=`) is the only safe reading. Unknown kinds are
/// skipped.
pub fn derive_levels(profile: Option<&Profile>) -> DerivedLevels {
    let Some(profile) = profile else {
        return DerivedLevels::default();
    };

    profile
        .upgrades
        .iter()
        .fold(DerivedLevels::default(), |mut levels, record| {
            let slot = match record.upgrade_type {
                UpgradeKind::MiningSpeed => &mut levels.speed,
                UpgradeKind::StorageSize => &mut levels.storage,
                UpgradeKind::HolyWater => &mut levels.holy,
                UpgradeKind::Unknown => return levels,
            };
            if record.upgrade_level >= *slot {
                *slot = record.upgrade_level;
            }
            levels
        })
}

/// Claim window implied by the profile's storage level. An absent profile
/// still yields the fallback window so callers never hit an error path here.
pub fn claim_window(profile: Option<&Profile>) -> ClaimWindow {
    let storage_level = derive_levels(profile).storage;
    let window_hours = levels::storage_window_hours(storage_level);
    ClaimWindow {
        window_hours,
        next_claim_at: profile
            .map(|profile| profile.last_claim + Duration::hours(window_hours as i64)),
    }
}

/// Signed distance to the next claim instant; negative once the window has
/// elapsed, 0 when no profile is available (forcing the default-sleep path).
pub fn seconds_until_next_claim(profile: Option<&Profile>, now: DateTime<Utc>) -> i64 {
    match claim_window(profile).next_claim_at {
        Some(next_claim_at) => (next_claim_at - now).num_seconds(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::UpgradeRecord;

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("valid rfc3339 timestamp")
    }

    fn record(upgrade_type: UpgradeKind, upgrade_level: u32) -> UpgradeRecord {
        UpgradeRecord {
            upgrade_type,
            upgrade_level,
        }
    }

    fn profile_with(upgrades: Vec<UpgradeRecord>) -> Profile {
        Profile {
            last_claim: at("2024-05-01T10:00:00Z"),
            upgrades,
        }
    }

    #[test]
    fn absent_profile_yields_zero_levels() {
        assert_eq!(derive_levels(None), DerivedLevels::default());
    }

    #[test]
    fn empty_upgrade_list_yields_zero_levels() {
        let profile = profile_with(Vec::new());
        assert_eq!(derive_levels(Some(&profile)), DerivedLevels::default());
    }

    #[test]
    fn duplicates_and_ordering_do_not_matter() {
        let profile = profile_with(vec![
            record(UpgradeKind::MiningSpeed, 3),
            record(UpgradeKind::StorageSize, 2),
            record(UpgradeKind::MiningSpeed, 1),
            record(UpgradeKind::MiningSpeed, 3),
            record(UpgradeKind::HolyWater, 4),
            record(UpgradeKind::StorageSize, 5),
        ]);

        let levels = derive_levels(Some(&profile));
        assert_eq!(levels.speed, 3);
        assert_eq!(levels.storage, 5);
        assert_eq!(levels.holy, 4);
    }

    #[test]
    fn unknown_kinds_are_ignored() {
        let profile = profile_with(vec![
            record(UpgradeKind::Unknown, 99),
            record(UpgradeKind::MiningSpeed, 1),
        ]);

        let levels = derive_levels(Some(&profile));
        assert_eq!(levels.speed, 1);
        assert_eq!(levels.storage, 0);
    }

    #[test]
    fn derive_levels_is_pure() {
        let profile = profile_with(vec![record(UpgradeKind::StorageSize, 3)]);
        let first = derive_levels(Some(&profile));
        let second = derive_levels(Some(&profile));
        assert_eq!(first, second);
    }

    #[test]
    fn window_uses_storage_level_table() {
        let profile = profile_with(vec![record(UpgradeKind::StorageSize, 3)]);
        let window = claim_window(Some(&profile));
        assert_eq!(window.window_hours, 6);
        assert_eq!(window.next_claim_at, Some(at("2024-05-01T16:00:00Z")));
    }

    #[test]
    fn absent_profile_takes_the_fallback_window_without_error() {
        let window = claim_window(None);
        assert_eq!(window.window_hours, levels::FALLBACK_WINDOW_HOURS);
        assert!(window.next_claim_at.is_none());
        assert_eq!(seconds_until_next_claim(None, at("2024-05-01T10:00:00Z")), 0);
    }

    #[test]
    fn unlisted_storage_level_falls_back_to_two_hours() {
        let profile = profile_with(vec![record(UpgradeKind::StorageSize, 9)]);
        let window = claim_window(Some(&profile));
        assert_eq!(window.window_hours, 2);
        assert_eq!(window.next_claim_at, Some(at("2024-05-01T12:00:00Z")));
    }

    #[test]
    fn seconds_until_next_claim_goes_negative_after_the_window() {
        let profile = profile_with(Vec::new());
        assert_eq!(
            seconds_until_next_claim(Some(&profile), at("2024-05-01T11:00:00Z")),
            3600
        );
        assert_eq!(
            seconds_until_next_claim(Some(&profile), at("2024-05-01T13:30:00Z")),
            -5400
        );
    }
}
