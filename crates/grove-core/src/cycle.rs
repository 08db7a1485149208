//! Cycle arithmetic shared by the account runner: credential freshness, sleep
//! computation, and action-reply interpretation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{ActionReply, Profile};

use crate::profile::seconds_until_next_claim;

/// Pause before resuming after a transient failure.
pub const TRANSIENT_RETRY_DELAY: Duration = Duration::from_secs(7);

/// Web-app credentials go stale after an hour and must be re-acquired.
pub const CREDENTIAL_TTL_SECS: i64 = 3600;

/// Whether the held credential (if any) must be re-acquired before the next
/// backend call.
pub fn credential_expired(obtained_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match obtained_at {
        Some(obtained_at) => (now - obtained_at).num_seconds() >= CREDENTIAL_TTL_SECS,
        None => true,
    }
}

/// Sleep until the next claim window opens, or the configured default when
/// the window has already elapsed or no profile is available.
pub fn sleep_duration(
    profile: Option<&Profile>,
    now: DateTime<Utc>,
    default_sleep_secs: u64,
) -> Duration {
    let remaining = seconds_until_next_claim(profile, now);
    if remaining <= 0 {
        Duration::from_secs(default_sleep_secs)
    } else {
        Duration::from_secs(remaining as u64)
    }
}

/// How a claim or upgrade action concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Accepted,
    Rejected(String),
}

/// An empty reply (or one without a message) is success; a message is a
/// normal negative outcome, not an error.
pub fn interpret_reply(reply: &ActionReply) -> PurchaseOutcome {
    match reply.rejection() {
        Some(message) => PurchaseOutcome::Rejected(message.to_string()),
        None => PurchaseOutcome::Accepted,
    }
}

/// What one pass of the decision cycle did, for logging and assertions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub balance: f64,
    pub claimed: bool,
    pub daily_claimed: bool,
    pub speed_upgraded: bool,
    pub storage_upgraded: bool,
    pub sleep: Duration,
}
