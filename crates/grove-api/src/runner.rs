//! The per-account cycle runner: drives one decision cycle end-to-end and
//! owns the retry/backoff policy around it. Only an unusable session ever
//! escapes the loop; everything else is absorbed with a short pause.

use std::fmt;

use chrono::{DateTime, Utc};
use contracts::{Profile, Settings};
use grove_core::cycle::{self, CycleReport, PurchaseOutcome};
use grove_core::eligibility::{can_claim, can_claim_daily, can_upgrade};
use grove_core::levels::UpgradeTrack;
use grove_core::profile::derive_levels;
use tracing::{error, info, warn};

use crate::auth::{AuthError, CredentialProvider};
use crate::client::{ApiError, GameApi};

/// The only error that crosses the runner boundary: the account's session is
/// unusable and its loop has stopped.
#[derive(Debug)]
pub enum RunnerError {
    Session(String),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(session) => write!(f, "session is invalid: {session}"),
        }
    }
}

impl std::error::Error for RunnerError {}

#[derive(Debug)]
pub(crate) enum CycleError {
    Fatal(String),
    Transient(String),
}

impl From<ApiError> for CycleError {
    fn from(value: ApiError) -> Self {
        Self::Transient(value.to_string())
    }
}

impl From<AuthError> for CycleError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidSession(session) => Self::Fatal(session),
            AuthError::Other(reason) => Self::Transient(reason),
        }
    }
}

/// One account's claim loop. Owns its client, credential source, and timers;
/// nothing is shared between accounts.
pub struct AccountRunner<C, P> {
    session: String,
    client: C,
    credentials: P,
    settings: Settings,
    credential_obtained_at: Option<DateTime<Utc>>,
}

impl<C, P> AccountRunner<C, P>
where
    C: GameApi + Send + Sync,
    P: CredentialProvider + Send,
{
    pub fn new(session: impl Into<String>, client: C, credentials: P, settings: Settings) -> Self {
        Self {
            session: session.into(),
            client,
            credentials,
            settings,
            credential_obtained_at: None,
        }
    }

    /// Run cycles until the session dies. Transient failures pause briefly
    /// and re-enter the loop; a completed cycle sleeps until the next claim
    /// window.
    pub async fn run(&mut self) -> RunnerError {
        loop {
            match self.cycle(Utc::now()).await {
                Ok(report) => {
                    info!(
                        session = %self.session,
                        sleep_secs = report.sleep.as_secs(),
                        "cycle complete, sleeping until the next claim check"
                    );
                    tokio::time::sleep(report.sleep).await;
                }
                Err(CycleError::Transient(reason)) => {
                    error!(session = %self.session, %reason, "cycle failed, backing off");
                    tokio::time::sleep(cycle::TRANSIENT_RETRY_DELAY).await;
                }
                Err(CycleError::Fatal(session)) => return RunnerError::Session(session),
            }
        }
    }

    /// One full decision pass: refresh the credential when stale, observe
    /// profile and balance, claim what is claimable, buy what is affordable,
    /// and compute the next sleep.
    pub(crate) async fn cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        self.ensure_credential(now).await?;

        let mut profile = self.client.profile().await?;
        let mut balance = self.client.balance().await?;
        info!(session = %self.session, balance, "balance fetched");

        let mut report = CycleReport::default();

        if can_claim(profile.as_ref(), now, self.settings.claim_min_percent) {
            let reply = self.client.claim().await?;
            match cycle::interpret_reply(&reply) {
                PurchaseOutcome::Accepted => {
                    balance = self.client.balance().await?;
                    profile = self.client.profile().await?;
                    report.claimed = true;
                    info!(session = %self.session, balance, "harvest claimed");
                }
                PurchaseOutcome::Rejected(message) => {
                    warn!(session = %self.session, %message, "harvest claim rejected");
                }
            }
        }

        let history = self.client.daily_bonuses().await?;
        if can_claim_daily(&history, now) {
            info!(session = %self.session, "daily bonus available, claiming");
            let reply = self.client.claim_daily().await?;
            match cycle::interpret_reply(&reply) {
                PurchaseOutcome::Accepted => {
                    balance = self.client.balance().await?;
                    report.daily_claimed = true;
                    info!(session = %self.session, balance, "daily bonus claimed");
                }
                PurchaseOutcome::Rejected(message) => {
                    warn!(session = %self.session, %message, "daily bonus claim rejected");
                }
            }
        }

        let levels = derive_levels(profile.as_ref());
        if self.settings.upgrade_speed
            && can_upgrade(
                UpgradeTrack::Speed,
                levels.speed,
                self.settings.speed_max_level,
                balance,
            )
        {
            report.speed_upgraded = self
                .run_upgrade(UpgradeTrack::Speed, &mut profile, &mut balance)
                .await?;
        }

        let levels = derive_levels(profile.as_ref());
        if self.settings.upgrade_storage
            && can_upgrade(
                UpgradeTrack::Storage,
                levels.storage,
                self.settings.storage_max_level,
                balance,
            )
        {
            report.storage_upgraded = self
                .run_upgrade(UpgradeTrack::Storage, &mut profile, &mut balance)
                .await?;
        }

        report.balance = balance;
        report.sleep = cycle::sleep_duration(profile.as_ref(), now, self.settings.default_sleep_secs);
        Ok(report)
    }

    async fn ensure_credential(&mut self, now: DateTime<Utc>) -> Result<(), CycleError> {
        if !cycle::credential_expired(self.credential_obtained_at, now) {
            return Ok(());
        }
        let credential = self.credentials.acquire().await?;
        self.client.set_credential(credential);
        self.credential_obtained_at = Some(now);
        info!(session = %self.session, "session credential refreshed");
        Ok(())
    }

    async fn run_upgrade(
        &mut self,
        track: UpgradeTrack,
        profile: &mut Option<Profile>,
        balance: &mut f64,
    ) -> Result<bool, CycleError> {
        let label = match track {
            UpgradeTrack::Speed => "speed",
            UpgradeTrack::Storage => "storage",
        };
        info!(session = %self.session, track = label, "upgrade affordable, purchasing");

        let reply = self.client.upgrade(track).await?;
        match cycle::interpret_reply(&reply) {
            PurchaseOutcome::Accepted => {
                *profile = self.client.profile().await?;
                *balance = self.client.balance().await?;
                info!(session = %self.session, track = label, balance = *balance, "upgrade purchased");
                Ok(true)
            }
            PurchaseOutcome::Rejected(message) => {
                error!(session = %self.session, track = label, %message, "upgrade rejected");
                Ok(false)
            }
        }
    }
}
