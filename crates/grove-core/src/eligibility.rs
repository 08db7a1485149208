//! The three pure decision functions: resource claim, daily bonus, upgrade
//! purchase.

use chrono::{DateTime, Utc};
use contracts::{BonusRecord, Profile};

use crate::levels::{self, UpgradeTrack};
use crate::profile::claim_window;

const SECONDS_PER_HOUR: f64 = 3600.0;
const DAILY_COOLDOWN_SECS: i64 = 24 * 3600;

/// Whether accumulated resources may be claimed now. True once the claim
/// window has fully elapsed, or earlier when at least `min_percent` of the
/// window has passed.
pub fn can_claim(profile: Option<&Profile>, now: DateTime<Utc>, min_percent: u32) -> bool {
    let Some(profile) = profile else {
        return false;
    };

    let window = claim_window(Some(profile));
    let Some(next_claim_at) = window.next_claim_at else {
        return false;
    };
    if now > next_claim_at {
        return true;
    }

    let elapsed = (now - profile.last_claim).num_seconds() as f64;
    let window_secs = window.window_hours as f64 * SECONDS_PER_HOUR;
    let percent = 100.0 * elapsed / window_secs;
    percent >= min_percent as f64
}

/// Whether the daily bonus may be claimed. An empty history means the bonus
/// was never collected and is claimable. Otherwise the latest record governs:
/// future-dated → not claimable; claimable only once a full 24h has passed
/// since it. A record in the past but younger than 24h is deliberately not
/// claimable, matching the live backend.
pub fn can_claim_daily(history: &[BonusRecord], now: DateTime<Utc>) -> bool {
    let Some(latest) = history.iter().map(|record| record.timestamp).max() else {
        return true;
    };

    if now <= latest {
        return false;
    }
    (now - latest).num_seconds() >= DAILY_COOLDOWN_SECS
}

/// Whether buying the next level on a track is both permitted and affordable.
/// One evaluator serves both tracks; the track only selects the cost table.
pub fn can_upgrade(track: UpgradeTrack, current_level: u32, max_level: u32, balance: f64) -> bool {
    let next = current_level + 1;
    if next > max_level {
        return false;
    }
    match levels::upgrade_cost(track, next) {
        Some(cost) => balance >= cost,
        None => false,
    }
}
