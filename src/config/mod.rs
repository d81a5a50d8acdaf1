use crate::watch::DeliveryPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete hostwatch configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostwatchConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Feed source configuration
#[derive(Clone, Deserialize)]
pub struct FeedConfig {
    /// LogMeIn profile id
    #[serde(default)]
    pub profile_id: u64,
    /// Secret feed key (prefer `HOSTWATCH_KEY`)
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Replay a saved feed document instead of polling over HTTP
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_base_url() -> String {
    crate::feed::BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            profile_id: 0,
            key: String::new(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            file: None,
        }
    }
}

// Keeps the key out of logs
impl std::fmt::Debug for FeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedConfig")
            .field("profile_id", &self.profile_id)
            .field("key", &if self.key.is_empty() { "" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("file", &self.file)
            .finish()
    }
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Polling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Process-wide floor for any polling interval
    #[serde(default = "default_minimum_interval")]
    pub minimum_interval_seconds: u64,
    /// Wait for the first tick instead of polling at startup
    #[serde(default = "default_start_delayed")]
    pub start_delayed: bool,
    #[serde(default)]
    pub delivery: DeliveryPolicy,
    /// Event channel capacity
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_interval() -> u64 {
    60
}

fn default_minimum_interval() -> u64 {
    60
}

fn default_start_delayed() -> bool {
    true
}

fn default_event_buffer() -> usize {
    1
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            minimum_interval_seconds: default_minimum_interval(),
            start_delayed: default_start_delayed(),
            delivery: DeliveryPolicy::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn minimum_interval(&self) -> Duration {
        Duration::from_secs(self.minimum_interval_seconds)
    }
}

/// Status API configuration
#[derive(Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Bearer token for PUT /api/admin/interval. None = PUT disabled.
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:3002".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_bind(),
            admin_token: None,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("enabled", &self.enabled)
            .field("bind", &self.bind)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HostwatchConfig {
    /// Override secrets and ids from the environment, ignoring unparsable values.
    ///
    /// - `HOSTWATCH_PROFILE_ID`
    /// - `HOSTWATCH_KEY`
    /// - `HOSTWATCH_ADMIN_TOKEN`
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("HOSTWATCH_PROFILE_ID") {
            if let Ok(id) = v.parse::<u64>() {
                self.feed.profile_id = id;
            }
        }
        if let Ok(v) = std::env::var("HOSTWATCH_KEY") {
            if !v.is_empty() {
                self.feed.key = v;
            }
        }
        if let Ok(v) = std::env::var("HOSTWATCH_ADMIN_TOKEN") {
            if !v.is_empty() {
                self.api.admin_token = Some(v);
            }
        }
    }
}

/// Load configuration from a TOML file, then apply environment overrides
pub fn load_config(path: impl AsRef<Path>) -> Result<HostwatchConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let mut config: HostwatchConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config.apply_env();
    Ok(config)
}
