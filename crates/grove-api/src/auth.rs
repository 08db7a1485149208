//! Credential acquisition seam. The messaging-platform flow that produces a
//! web-app payload lives behind `CredentialProvider`; what ships here is the
//! payload extraction from a web-view URL and a file-backed provider.

use std::fmt;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

pub const WEB_APP_DATA_MARKER: &str = "tgWebAppData=";
const WEB_APP_VERSION_MARKER: &str = "&tgWebAppVersion";

#[derive(Debug)]
pub enum AuthError {
    /// The session can no longer produce a credential; retrying is pointless.
    InvalidSession(String),
    /// Anything else — worth retrying on the next cycle.
    Other(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSession(session) => write!(f, "session is invalid: {session}"),
            Self::Other(reason) => write!(f, "credential acquisition failed: {reason}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Produces the session credential attached to every backend call.
#[async_trait]
pub trait CredentialProvider {
    async fn acquire(&mut self) -> Result<String, AuthError>;
}

/// Reads the credential from a per-account session file holding either the
/// raw web-app payload or the full web-view URL it is embedded in. The file
/// is re-read on every acquisition so a refreshed payload is picked up
/// without a restart.
pub struct FileCredentialProvider {
    session: String,
    path: PathBuf,
}

impl FileCredentialProvider {
    pub fn new(session: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            session: session.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialProvider {
    async fn acquire(&mut self) -> Result<String, AuthError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(AuthError::InvalidSession(self.session.clone()))
            }
            Err(err) => return Err(AuthError::Other(err.to_string())),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuthError::InvalidSession(self.session.clone()));
        }
        if trimmed.contains(WEB_APP_DATA_MARKER) {
            return extract_web_app_data(trimmed)
                .ok_or_else(|| AuthError::InvalidSession(self.session.clone()));
        }
        Ok(trimmed.to_string())
    }
}

/// Pull the web-app payload out of a web-view URL. The payload sits between
/// `tgWebAppData=` and `&tgWebAppVersion` and is percent-encoded twice.
pub fn extract_web_app_data(url: &str) -> Option<String> {
    let (_, tail) = url.split_once(WEB_APP_DATA_MARKER)?;
    let span = tail.split(WEB_APP_VERSION_MARKER).next().unwrap_or(tail);
    if span.is_empty() {
        return None;
    }
    Some(percent_decode(&percent_decode(span)))
}

/// Minimal percent-decoder: hex escapes only; `+` and malformed escapes pass
/// through untouched.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|value| value as u8)
}
