//! Startup configuration.
//!
//! Everything is read once from the environment (after `.env` is loaded by
//! `main`) plus the optional credentials file, and is immutable afterwards.

mod credentials;

pub use credentials::{Credentials, USER_NAME_ENV, USER_PASSWORD_ENV};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::recorder::StreamlinkConfig;
use crate::{Error, Result};

/// Default credentials file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default seconds between unsuccessful polls.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 60;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Platform endpoints used by the session and status clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    /// Credential exchange endpoint.
    pub login_url: String,
    /// Channel live-status endpoint.
    pub live_api_url: String,
    /// HLS playlist base; the stream-access token is appended as `aid`.
    pub playlist_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            login_url: "https://login.afreecatv.com/app/LoginAction.php".to_string(),
            live_api_url: "https://live.afreecatv.com/afreeca/player_live_api.php".to_string(),
            playlist_url:
                "https://live-global-cdn-v02.afreecatv.com/live-stm-16/auth_playlist.m3u8"
                    .to_string(),
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    /// Sleep between polls that did not lead to a recording.
    pub retry_interval: Duration,
    /// Timeout applied to every platform HTTP request.
    pub http_timeout: Duration,
    /// Root under which one directory per channel is created.
    pub output_dir: PathBuf,
    /// Directory for rolling log files; console only when unset.
    pub log_dir: Option<PathBuf>,
    pub endpoints: ApiEndpoints,
    pub streamlink: StreamlinkConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env(config_file: Option<&Path>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), config_file)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, config_file: Option<&Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let credentials = Credentials::load(&lookup, config_file)?;

        let retry_interval = Duration::from_secs(positive_u64(
            &lookup,
            "RETRY_INTERVAL",
            DEFAULT_RETRY_INTERVAL_SECS,
        )?);
        let http_timeout = Duration::from_secs(positive_u64(
            &lookup,
            "HTTP_TIMEOUT",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let output_dir = non_empty(&lookup, "OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_dir = non_empty(&lookup, "LOG_DIR").map(PathBuf::from);

        let mut streamlink = StreamlinkConfig::default();
        if let Some(path) = non_empty(&lookup, "STREAMLINK_PATH") {
            streamlink.binary_path = path;
        }
        if let Some(quality) = non_empty(&lookup, "STREAM_QUALITY") {
            streamlink.quality = quality;
        }
        if let Some(extension) = non_empty(&lookup, "RECORDING_EXTENSION") {
            streamlink.extension = extension.trim_start_matches('.').to_string();
        }
        streamlink.segment_threads =
            positive_u64(&lookup, "SEGMENT_THREADS", streamlink.segment_threads.into())? as u32;
        streamlink.segment_attempts =
            positive_u64(&lookup, "SEGMENT_ATTEMPTS", streamlink.segment_attempts.into())? as u32;

        Ok(Self {
            credentials,
            retry_interval,
            http_timeout,
            output_dir,
            log_dir,
            endpoints: ApiEndpoints::default(),
            streamlink,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(default);
    };

    match raw.parse::<u64>() {
        Ok(0) => Err(Error::config(format!("{key} must be greater than zero"))),
        Ok(value) if value > u64::from(u32::MAX) => {
            Err(Error::config(format!("{key} is too large: {value}")))
        }
        Ok(value) => Ok(value),
        Err(_) => Err(Error::config(format!(
            "{key} must be a positive integer, got {raw:?}"
        ))),
    }
}
