//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_STATE_DIR: &str = ".taskboard";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MOCK_LATENCY_MS: u64 = 0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("unsupported API URL scheme: {0} (expected http:// or https://)")]
    InvalidApiUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl HttpTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the users/auth backend, without trailing slash.
    pub api_url: String,
    /// Directory holding the durable session storage file.
    pub state_dir: PathBuf,
    pub timeouts: HttpTimeouts,
    /// Simulated network delay applied to board store actions.
    pub mock_latency: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            timeouts: HttpTimeouts::default(),
            mock_latency: Duration::from_millis(DEFAULT_MOCK_LATENCY_MS),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `TASKBOARD_API_URL`: default `http://127.0.0.1:8080`
    /// - `TASKBOARD_STATE_DIR`: default `.taskboard`
    /// - `TASKBOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `TASKBOARD_CONNECT_TIMEOUT_SECS`: default 10
    /// - `TASKBOARD_MOCK_LATENCY_MS`: default 0
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse or the API URL
    /// is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = normalize_api_url(lookup("TASKBOARD_API_URL").as_deref().unwrap_or(DEFAULT_API_URL))?;
        let state_dir = lookup("TASKBOARD_STATE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: parse_u64(&lookup, "TASKBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_u64(&lookup, "TASKBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let mock_latency =
            Duration::from_millis(parse_u64(&lookup, "TASKBOARD_MOCK_LATENCY_MS", DEFAULT_MOCK_LATENCY_MS)?);

        Ok(Self { api_url, state_dir, timeouts, mock_latency })
    }

    /// Replace the API URL, applying the same checks as the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] for non-HTTP URLs.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(raw)?;
        Ok(self)
    }

    /// Path of the file backing durable session storage.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.state_dir.join("storage.json")
    }
}

pub(crate) fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidApiUrl(raw.to_owned()))
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
