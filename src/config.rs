//! Configuration module for rss-notify.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{RelayError, Result};

/// Feed source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// URL of the RSS feed to monitor.
    #[serde(default)]
    pub url: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_feed_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_feed_connect_timeout() -> u64 {
    10
}

fn default_feed_timeout() -> u64 {
    30
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout_secs: default_feed_connect_timeout(),
            timeout_secs: default_feed_timeout(),
            max_feed_size_bytes: default_max_feed_size(),
        }
    }
}

/// Chat webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL notifications are posted to.
    #[serde(default)]
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

fn default_webhook_timeout() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_webhook_timeout(),
        }
    }
}

/// Operating mode of the process deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Check on a schedule until stopped.
    #[default]
    Production,
    /// Deliver the newest entry once and exit.
    Test,
}

impl RunMode {
    /// Parse a mode name; anything other than `test` means production.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("test") {
            RunMode::Test
        } else {
            RunMode::Production
        }
    }
}

/// Poll cycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Operating mode.
    #[serde(default)]
    pub mode: RunMode,
    /// Minutes between scheduled checks.
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u64,
    /// Pause between successive notifications in milliseconds.
    #[serde(default = "default_courtesy_delay")]
    pub courtesy_delay_ms: u64,
    /// Keyword allow-list for the trigger-driven cycle (empty = no filtering).
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_check_interval() -> u64 {
    5
}

/// Longest accepted check interval (one week).
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.min(MAX_CHECK_INTERVAL_MINUTES) * 60)
}

fn default_courtesy_delay() -> u64 {
    1000
}

impl MonitorConfig {
    /// Interval between scheduled checks.
    pub fn check_interval(&self) -> Duration {
        minutes(self.check_interval_minutes)
    }

    /// Courtesy delay between notifications.
    pub fn courtesy_delay(&self) -> Duration {
        Duration::from_millis(self.courtesy_delay_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            check_interval_minutes: default_check_interval(),
            courtesy_delay_ms: default_courtesy_delay(),
            keywords: Vec::new(),
        }
    }
}

/// Backing resource for the seen-item store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Pretty-printed JSON file.
    #[default]
    File,
    /// SQLite key-value table.
    Sqlite,
}

/// Seen-item store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend kind.
    #[serde(default)]
    pub backend: StoreKind,
    /// Path to the JSON file or SQLite database. Empty selects the
    /// backend's default path.
    #[serde(default)]
    pub path: String,
    /// Maximum number of records kept.
    #[serde(default = "default_store_capacity")]
    pub capacity: usize,
}

impl StoreKind {
    /// Store location used when no path is configured.
    pub fn default_path(&self) -> &'static str {
        match self {
            StoreKind::File => "data/pushed-items.json",
            StoreKind::Sqlite => "data/pushed-items.db",
        }
    }
}

fn default_store_capacity() -> usize {
    100
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreKind::default(),
            path: String::new(),
            capacity: default_store_capacity(),
        }
    }
}

impl StoreConfig {
    /// Configured path, or the backend default when none is set.
    pub fn resolved_path(&self) -> &str {
        if self.path.trim().is_empty() {
            self.backend.default_path()
        } else {
            &self.path
        }
    }
}

/// Trigger surface configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Minutes between timer-triggered checks (0 disables the timer).
    #[serde(default = "default_web_check_interval")]
    pub check_interval_minutes: u64,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8787
}

fn default_web_check_interval() -> u64 {
    5
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            check_interval_minutes: default_web_check_interval(),
        }
    }
}

impl WebConfig {
    /// Interval of the timer trigger, `None` when disabled.
    pub fn check_interval(&self) -> Option<Duration> {
        (self.check_interval_minutes > 0).then(|| minutes(self.check_interval_minutes))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file (empty = console only).
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Feed configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Webhook configuration.
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Monitor configuration.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Trigger surface configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RelayError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file if it exists, then apply environment overrides.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| RelayError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `RSS_FEED_URL`: feed URL
    /// - `WEBHOOK_URL` (or `FEISHU_WEBHOOK_URL`): webhook URL
    /// - `MODE`: `test` or `production`
    /// - `CHECK_INTERVAL`: minutes between checks
    /// - `KEYWORDS`: comma separated keyword allow-list
    /// - `STORE_PATH`: store file path
    /// - `LOG_LEVEL`: log level
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values never override.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("RSS_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(url) = get("WEBHOOK_URL").or_else(|| get("FEISHU_WEBHOOK_URL")) {
            self.webhook.url = url;
        }
        if let Some(mode) = get("MODE") {
            self.monitor.mode = RunMode::from_name(&mode);
        }
        if let Some(interval) = get("CHECK_INTERVAL") {
            match interval.trim().parse() {
                Ok(minutes) => self.monitor.check_interval_minutes = minutes,
                Err(_) => tracing::warn!(value = %interval, "Ignoring invalid CHECK_INTERVAL"),
            }
        }
        if let Some(keywords) = get("KEYWORDS") {
            self.monitor.keywords = keywords
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        if let Some(path) = get("STORE_PATH") {
            self.store.path = path;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the feed or webhook URL is missing or not an http(s) URL
    /// - the check interval is zero or longer than a week
    /// - the store capacity is zero
    pub fn validate(&self) -> Result<()> {
        validate_url("feed.url (RSS_FEED_URL)", &self.feed.url)?;
        validate_url("webhook.url (WEBHOOK_URL)", &self.webhook.url)?;

        if self.monitor.check_interval_minutes == 0 {
            return Err(RelayError::Config(
                "monitor.check_interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.monitor.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(RelayError::Config(format!(
                "monitor.check_interval_minutes must be at most {MAX_CHECK_INTERVAL_MINUTES}"
            )));
        }
        if self.web.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(RelayError::Config(format!(
                "web.check_interval_minutes must be at most {MAX_CHECK_INTERVAL_MINUTES}"
            )));
        }
        if self.store.capacity == 0 {
            return Err(RelayError::Config(
                "store.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::Config(format!(
            "{name} is not set. Set it in config.toml or via the environment."
        )));
    }

    let parsed = url::Url::parse(value)
        .map_err(|e| RelayError::Config(format!("{name} is not a valid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(RelayError::Config(format!(
            "{name} uses unsupported scheme: {scheme}"
        ))),
    }
}
