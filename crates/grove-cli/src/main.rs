use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use contracts::Settings;
use grove_api::auth::{CredentialProvider, FileCredentialProvider};
use grove_api::client::{GameApi, HttpGameClient, DEFAULT_BASE_URL};
use grove_api::proxy::{assign_proxy, load_proxies};
use grove_api::runner::{AccountRunner, RunnerError};
use grove_core::eligibility::can_claim;
use grove_core::profile::{derive_levels, seconds_until_next_claim};
use tracing::{error, info};

fn print_usage() {
    println!("grove <command>");
    println!("commands:");
    println!("  run              start a claim loop for every session file (default)");
    println!("  check            print one-shot balance and eligibility per session");
    println!("environment:");
    println!("  SESSIONS_DIR     directory of *.session credential files (default: sessions)");
    println!("  PROXIES_FILE     proxy list, one url per line (default: proxies.txt)");
    println!("  GROVE_BASE_URL   backend base url");
    println!("  CLAIM_MIN_PERCENT, CLAIM_RETRY_COUNT, UPGRADE_SPEED, SPEED_MAX_LEVEL,");
    println!("  UPGRADE_STORAGE, STORAGE_MAX_LEVEL, DEFAULT_SLEEP, USE_PROXY_FROM_FILE");
}

#[derive(Debug)]
struct SettingsError {
    key: &'static str,
    raw: String,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.raw)
    }
}

fn parse_value<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    target: &mut T,
) -> Result<(), SettingsError> {
    let Some(raw) = raw else {
        return Ok(());
    };
    match raw.trim().parse::<T>() {
        Ok(value) => {
            *target = value;
            Ok(())
        }
        Err(_) => Err(SettingsError { key, raw }),
    }
}

fn parse_flag(
    key: &'static str,
    raw: Option<String>,
    target: &mut bool,
) -> Result<(), SettingsError> {
    let Some(raw) = raw else {
        return Ok(());
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => *target = true,
        "0" | "false" | "no" | "off" => *target = false,
        _ => return Err(SettingsError { key, raw }),
    }
    Ok(())
}

fn settings_from_env() -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();
    let var = |key: &str| env::var(key).ok();

    parse_value("CLAIM_MIN_PERCENT", var("CLAIM_MIN_PERCENT"), &mut settings.claim_min_percent)?;
    parse_value("CLAIM_RETRY_COUNT", var("CLAIM_RETRY_COUNT"), &mut settings.claim_retry_count)?;
    parse_flag("UPGRADE_SPEED", var("UPGRADE_SPEED"), &mut settings.upgrade_speed)?;
    parse_value("SPEED_MAX_LEVEL", var("SPEED_MAX_LEVEL"), &mut settings.speed_max_level)?;
    parse_flag("UPGRADE_STORAGE", var("UPGRADE_STORAGE"), &mut settings.upgrade_storage)?;
    parse_value("STORAGE_MAX_LEVEL", var("STORAGE_MAX_LEVEL"), &mut settings.storage_max_level)?;
    parse_value("DEFAULT_SLEEP", var("DEFAULT_SLEEP"), &mut settings.default_sleep_secs)?;
    parse_flag("USE_PROXY_FROM_FILE", var("USE_PROXY_FROM_FILE"), &mut settings.use_proxy_from_file)?;
    Ok(settings)
}

fn env_or(key: &str, fallback: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Every `*.session` file under the directory is one account; the file stem
/// is the session name used in log lines.
fn discover_sessions(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut sessions = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("session") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            sessions.push((stem.to_string(), path));
        }
    }
    sessions.sort();
    Ok(sessions)
}

fn sessions_or_exit() -> Vec<(String, PathBuf)> {
    let dir = env_or("SESSIONS_DIR", "sessions");
    match discover_sessions(Path::new(&dir)) {
        Ok(sessions) if !sessions.is_empty() => sessions,
        Ok(_) => {
            eprintln!("error: no *.session files under {dir}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("error: cannot read {dir}: {err}");
            std::process::exit(2);
        }
    }
}

async fn run_all(settings: Settings) {
    let sessions = sessions_or_exit();
    let base = env_or("GROVE_BASE_URL", DEFAULT_BASE_URL);

    let proxies = if settings.use_proxy_from_file {
        let path = env_or("PROXIES_FILE", "proxies.txt");
        match load_proxies(Path::new(&path)) {
            Ok(proxies) => proxies,
            Err(err) => {
                eprintln!("error: cannot read {path}: {err}");
                std::process::exit(2);
            }
        }
    } else {
        Vec::new()
    };

    let mut handles = Vec::new();
    for (index, (session, path)) in sessions.into_iter().enumerate() {
        let proxy = assign_proxy(&proxies, index).map(str::to_string);
        let client = match HttpGameClient::new(base.clone(), proxy.as_deref()) {
            Ok(client) => client,
            Err(err) => {
                error!(%session, %err, "failed to build http client");
                continue;
            }
        };
        if proxy.is_some() {
            match client.probe_proxy().await {
                Ok(ip) => info!(%session, %ip, "proxy reachable"),
                Err(err) => error!(%session, %err, "proxy probe failed"),
            }
        }

        let credentials = FileCredentialProvider::new(session.clone(), path);
        let mut runner = AccountRunner::new(session, client, credentials, settings.clone());
        handles.push(tokio::spawn(async move {
            let RunnerError::Session(session) = runner.run().await;
            error!(%session, "session invalid, runner stopped");
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}

async fn check_all(settings: Settings) {
    let sessions = sessions_or_exit();
    let base = env_or("GROVE_BASE_URL", DEFAULT_BASE_URL);
    let now = Utc::now();

    for (session, path) in sessions {
        let mut client = match HttpGameClient::new(base.clone(), None) {
            Ok(client) => client,
            Err(err) => {
                error!(%session, %err, "failed to build http client");
                continue;
            }
        };

        let mut credentials = FileCredentialProvider::new(session.clone(), path);
        match credentials.acquire().await {
            Ok(credential) => client.set_credential(credential),
            Err(err) => {
                error!(%session, %err, "credential unavailable");
                continue;
            }
        }

        match (client.profile().await, client.balance().await) {
            (Ok(profile), Ok(balance)) => {
                let levels = derive_levels(profile.as_ref());
                let claimable = can_claim(profile.as_ref(), now, settings.claim_min_percent);
                let wait = seconds_until_next_claim(profile.as_ref(), now);
                println!(
                    "{session}: balance={balance:.6} speed={} storage={} claimable={claimable} next_claim_in={wait}s",
                    levels.speed, levels.storage
                );
            }
            (Err(err), _) | (_, Err(err)) => error!(%session, %err, "fetch failed"),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("run");

    let settings = match settings_from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err}");
            print_usage();
            std::process::exit(2);
        }
    };

    match command {
        "run" => run_all(settings).await,
        "check" => check_all(settings).await,
        _ => print_usage(),
    }
}
