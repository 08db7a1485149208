//! The backend API collaborator: a trait describing the calls the runner
//! needs, and the reqwest implementation against the live service.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use contracts::{
    ActionReply, BonusHistory, BonusRecord, Envelope, Profile, NANO_UNITS_PER_COIN,
};
use grove_core::levels::UpgradeTrack;
use reqwest::{Method, Proxy, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://elb.seeddao.org";

const SESSION_HEADER: &str = "Telegram-Data";
const USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Mobile Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const PROFILE_PATH: &str = "/api/v1/profile";
const BALANCE_PATH: &str = "/api/v1/profile/balance";
const CLAIM_PATH: &str = "/api/v1/seed/claim";
const LOGIN_BONUSES_PATH: &str = "/api/v1/login-bonuses";
const SPEED_UPGRADE_PATH: &str = "/api/v1/seed/mining-speed/upgrade";
const STORAGE_UPGRADE_PATH: &str = "/api/v1/seed/storage-size/upgrade";

const PROXY_PROBE_URL: &str = "https://httpbin.org/ip";
const PROXY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    Status(StatusCode),
    MissingData(&'static str),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "http error: {err}"),
            Self::Status(status) => write!(f, "unexpected status: {status}"),
            Self::MissingData(field) => write!(f, "response is missing data: {field}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// The API surface the runner consumes. Kept as a trait so the cycle logic
/// can be exercised against scripted fakes.
#[async_trait]
pub trait GameApi {
    /// Install the session credential used on subsequent calls.
    fn set_credential(&mut self, credential: String);

    async fn balance(&self) -> Result<f64, ApiError>;
    async fn profile(&self) -> Result<Option<Profile>, ApiError>;
    async fn claim(&self) -> Result<ActionReply, ApiError>;
    async fn daily_bonuses(&self) -> Result<Vec<BonusRecord>, ApiError>;
    async fn claim_daily(&self) -> Result<ActionReply, ApiError>;
    async fn upgrade(&self, track: UpgradeTrack) -> Result<ActionReply, ApiError>;
}

/// reqwest-backed implementation against the live backend.
pub struct HttpGameClient {
    base: String,
    http: reqwest::Client,
    credential: Option<String>,
}

impl HttpGameClient {
    pub fn new(base: impl Into<String>, proxy: Option<&str>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT);
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }
        Ok(Self {
            base: base.into(),
            http: builder.build()?,
            credential: None,
        })
    }

    /// Fetch the egress IP through the configured proxy; used once at startup
    /// to confirm the proxy is alive before the cycle loop begins.
    pub async fn probe_proxy(&self) -> Result<String, ApiError> {
        #[derive(serde::Deserialize)]
        struct ProbeReply {
            origin: String,
        }

        let reply: ProbeReply = self
            .http
            .get(PROXY_PROBE_URL)
            .timeout(PROXY_PROBE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply.origin)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base, path));
        if let Some(credential) = &self.credential {
            builder = builder.header(SESSION_HEADER, credential);
        }
        builder
    }

    async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn post_action(&self, path: &str) -> Result<ActionReply, ApiError> {
        let response = self
            .request(Method::POST, path)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        decode_action_body(status, &body)
    }
}

#[async_trait]
impl GameApi for HttpGameClient {
    fn set_credential(&mut self, credential: String) {
        self.credential = Some(credential);
    }

    async fn balance(&self) -> Result<f64, ApiError> {
        let envelope: Envelope<Value> = self.get_envelope(BALANCE_PATH).await?;
        let nano = envelope
            .data
            .as_ref()
            .and_then(coerce_amount)
            .ok_or(ApiError::MissingData("balance"))?;
        Ok(nano / NANO_UNITS_PER_COIN)
    }

    async fn profile(&self) -> Result<Option<Profile>, ApiError> {
        let envelope: Envelope<Profile> = self.get_envelope(PROFILE_PATH).await?;
        Ok(envelope.data)
    }

    async fn claim(&self) -> Result<ActionReply, ApiError> {
        self.post_action(CLAIM_PATH).await
    }

    async fn daily_bonuses(&self) -> Result<Vec<BonusRecord>, ApiError> {
        let envelope: Envelope<BonusHistory> = self.get_envelope(LOGIN_BONUSES_PATH).await?;
        Ok(envelope
            .data
            .map(BonusHistory::into_records)
            .unwrap_or_default())
    }

    async fn claim_daily(&self) -> Result<ActionReply, ApiError> {
        self.post_action(LOGIN_BONUSES_PATH).await
    }

    async fn upgrade(&self, track: UpgradeTrack) -> Result<ActionReply, ApiError> {
        self.post_action(upgrade_path(track)).await
    }
}

fn upgrade_path(track: UpgradeTrack) -> &'static str {
    match track {
        UpgradeTrack::Speed => SPEED_UPGRADE_PATH,
        UpgradeTrack::Storage => STORAGE_UPGRADE_PATH,
    }
}

/// The backend reports the balance as either a JSON number or a numeric
/// string; both appear in the wild.
fn coerce_amount(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
}

/// Action endpoints answer success with an empty (or message-free) body.
/// A body carrying a message is a normal rejection regardless of status;
/// a failure status without a message is a transport-level error.
fn decode_action_body(status: StatusCode, body: &str) -> Result<ActionReply, ApiError> {
    let reply: ActionReply = match body.trim() {
        "" => ActionReply::default(),
        trimmed => serde_json::from_str(trimmed).unwrap_or_default(),
    };
    if reply.rejection().is_none() && !status.is_success() {
        return Err(ApiError::Status(status));
    }
    Ok(reply)
}
