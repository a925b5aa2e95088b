//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which credentials are stored.
pub const KEYRING_SERVICE: &str = "cache-intercom";

/// Nested Slack configuration for Socket Mode connectivity.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Web API root used for every Slack call.
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for posting messages (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_url: default_slack_api_url(),
            app_token: String::new(),
            bot_token: String::new(),
        }
    }
}

/// CDN purge endpoint settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CdnConfig {
    /// Zone whose cache is purged.
    pub zone_id: String,
    /// API root; `/zones/{zone}/purge_cache` is appended to it.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Upper bound on a single purge round trip.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Bearer token (populated at runtime).
    #[serde(skip)]
    pub api_token: String,
}

impl CdnConfig {
    /// Full URL of the purge endpoint for the configured zone.
    #[must_use]
    pub fn purge_url(&self) -> String {
        format!(
            "{}/zones/{}/purge_cache",
            self.api_base.trim_end_matches('/'),
            self.zone_id
        )
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Batch dispatcher timing and capacity.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DispatchConfig {
    /// Seconds between flush ticks.
    #[serde(default = "default_flush_interval")]
    pub flush_interval_seconds: u64,
    /// Capacity of the handoff channel between the chat consumer and the dispatcher.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum number of jobs held for a single flush.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl DispatchConfig {
    /// Flush period as a [`Duration`].
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_seconds)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            flush_interval_seconds: default_flush_interval(),
            queue_capacity: default_queue_capacity(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".into()
}

fn default_api_base() -> String {
    "https://api.cloudflare.com/client/v4".into()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_flush_interval() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    10
}

fn default_buffer_capacity() -> usize {
    256
}

fn default_trigger_phrase() -> String {
    "clear cache".into()
}

fn default_max_uris() -> usize {
    30
}

fn default_true() -> bool {
    true
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Phrase whose presence in a message starts a purge request.
    #[serde(default = "default_trigger_phrase")]
    pub trigger_phrase: String,
    /// Upper bound on derived URLs per request.
    #[serde(default = "default_max_uris")]
    pub max_uris: usize,
    /// Origins prepended to every requested path.
    #[serde(default)]
    pub url_bases: Vec<String>,
    /// Index-style variants appended to every requested path.
    #[serde(default)]
    pub url_suffixes: Vec<String>,
    /// Channel names where only authorised users may issue commands.
    #[serde(default)]
    pub restricted_channels: Vec<String>,
    /// User names allowed to issue commands in restricted channels.
    #[serde(default)]
    pub authorised_users: Vec<String>,
    /// Post a greeting into every member channel at startup.
    #[serde(default = "default_true")]
    pub announce_on_startup: bool,
    /// CDN connectivity.
    pub cdn: CdnConfig,
    /// Dispatcher tuning.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Slack connectivity settings.
    #[serde(default)]
    pub slack: SlackConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load CDN and Slack credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `cache-intercom` keyring service first, then falls back to
    /// `CF_TOKEN`, `SLACK_APP_TOKEN` and `SLACK_BOT_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required tokens.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.cdn.api_token = load_credential("cf_token", "CF_TOKEN").await?;
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.cdn.zone_id.trim().is_empty() {
            return Err(AppError::Config("cdn.zone_id must not be empty".into()));
        }

        if self.trigger_phrase.trim().is_empty() {
            return Err(AppError::Config("trigger_phrase must not be empty".into()));
        }

        if self.url_bases.is_empty() {
            return Err(AppError::Config("url_bases must not be empty".into()));
        }

        if self.max_uris == 0 {
            return Err(AppError::Config("max_uris must be greater than zero".into()));
        }

        if self.dispatch.flush_interval_seconds == 0 {
            return Err(AppError::Config(
                "dispatch.flush_interval_seconds must be greater than zero".into(),
            ));
        }

        if self.dispatch.queue_capacity == 0 || self.dispatch.buffer_capacity == 0 {
            return Err(AppError::Config(
                "dispatch capacities must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
