//! Configuration system for lexicard.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LexicardError, LexicardResult};
use crate::types::DEFAULT_REMINDER_INTERVAL_MINUTES;

/// Upper bound for `summary_tolerance_secs`: half a day either side.
pub const MAX_SUMMARY_TOLERANCE_SECS: u64 = 12 * 60 * 60;

/// Timing of the background scheduler loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between ticks (default: 60).
    pub tick_interval_secs: u64,
    /// Seconds to wait before the first tick so the transport can connect (default: 5).
    pub warmup_secs: u64,
    /// UTC time of day the daily summary is sent (default: 21:00:00).
    pub daily_summary_time: NaiveTime,
    /// How far from `daily_summary_time` a tick may land and still send (default: 60).
    pub summary_tolerance_secs: u64,
    /// Learners processed concurrently within a tick (default: 1, sequential).
    pub learner_concurrency: usize,
    /// Seed for card selection; `None` seeds from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            warmup_secs: 5,
            daily_summary_time: default_summary_time(),
            summary_tolerance_secs: 60,
            learner_concurrency: 1,
            rng_seed: None,
        }
    }
}

fn default_summary_time() -> NaiveTime {
    NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl SchedulerConfig {
    /// Tick period as a std duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    /// Warm-up delay as a std duration.
    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    /// Summary tolerance window, capped at [`MAX_SUMMARY_TOLERANCE_SECS`].
    pub fn summary_tolerance(&self) -> chrono::Duration {
        let secs = self.summary_tolerance_secs.min(MAX_SUMMARY_TOLERANCE_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

/// Retry policy for outbound deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Maximum delay between retries (milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 10_000,
            multiplier: 2.0_f32,
        }
    }
}

/// Outbound notifier configuration.
///
/// Without a `webhook_url` messages are only logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Secret for HMAC signing of webhook payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub retry_policy: RetryPolicy,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            secret: None,
            timeout_secs: 10,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Main lexicard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicardConfig {
    /// Path to the SQLite database.
    pub database_path: PathBuf,
    /// Reminder cadence given to newly created learners.
    pub default_reminder_interval_minutes: i32,
    pub scheduler: SchedulerConfig,
    pub notifier: NotifierConfig,
}

impl Default for LexicardConfig {
    fn default() -> Self {
        let lexicard_dir = dirs::home_dir()
            .map(|h| h.join(".lexicard"))
            .unwrap_or_else(|| PathBuf::from(".lexicard"));

        Self {
            database_path: lexicard_dir.join("lexicard.db"),
            default_reminder_interval_minutes: DEFAULT_REMINDER_INTERVAL_MINUTES,
            scheduler: SchedulerConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl LexicardConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> LexicardResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| LexicardError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| LexicardError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| LexicardError::Configuration(e.to_string()))?,
            _ => {
                return Err(LexicardError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `LEXICARD_DB_PATH`
    /// - `LEXICARD_DEFAULT_REMINDER_MINUTES`
    /// - `LEXICARD_TICK_SECS`
    /// - `LEXICARD_WARMUP_SECS`
    /// - `LEXICARD_DAILY_SUMMARY_TIME` (`HH:MM` or `HH:MM:SS`, UTC)
    /// - `LEXICARD_LEARNER_CONCURRENCY`
    /// - `LEXICARD_WEBHOOK_URL`, `LEXICARD_WEBHOOK_SECRET`
    ///
    /// Unset variables keep their defaults; malformed ones are errors.
    pub fn from_env() -> LexicardResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("LEXICARD_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(minutes) = parse_env("LEXICARD_DEFAULT_REMINDER_MINUTES")? {
            config.default_reminder_interval_minutes = minutes;
        }
        if let Some(secs) = parse_env("LEXICARD_TICK_SECS")? {
            config.scheduler.tick_interval_secs = secs;
        }
        if let Some(secs) = parse_env("LEXICARD_WARMUP_SECS")? {
            config.scheduler.warmup_secs = secs;
        }
        if let Ok(time) = std::env::var("LEXICARD_DAILY_SUMMARY_TIME") {
            config.scheduler.daily_summary_time = parse_time_of_day(&time)?;
        }
        if let Some(n) = parse_env("LEXICARD_LEARNER_CONCURRENCY")? {
            config.scheduler.learner_concurrency = n;
        }

        if let Ok(url) = std::env::var("LEXICARD_WEBHOOK_URL") {
            config.notifier.webhook_url = Some(url);
        }
        if let Ok(secret) = std::env::var("LEXICARD_WEBHOOK_SECRET") {
            config.notifier.secret = Some(secret);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> LexicardResult<()> {
        if self.scheduler.tick_interval_secs == 0 {
            return Err(LexicardError::Configuration(
                "scheduler.tick_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.scheduler.summary_tolerance_secs == 0
            || self.scheduler.summary_tolerance_secs > MAX_SUMMARY_TOLERANCE_SECS
        {
            return Err(LexicardError::Configuration(format!(
                "scheduler.summary_tolerance_secs must be between 1 and {}",
                MAX_SUMMARY_TOLERANCE_SECS
            )));
        }
        if self.default_reminder_interval_minutes < 1 {
            return Err(LexicardError::Configuration(
                "default_reminder_interval_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> LexicardConfigBuilder {
        LexicardConfigBuilder::default()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> LexicardResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| LexicardError::Configuration(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

/// Parse a UTC time of day given as `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> LexicardResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|e| LexicardError::Configuration(format!("invalid time of day '{}': {}", raw, e)))
}

/// Builder for LexicardConfig.
#[derive(Default)]
pub struct LexicardConfigBuilder {
    config: LexicardConfig,
}

impl LexicardConfigBuilder {
    /// Set database path.
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    /// Set the reminder cadence for new learners.
    pub fn default_reminder_interval_minutes(mut self, minutes: i32) -> Self {
        self.config.default_reminder_interval_minutes = minutes;
        self
    }

    /// Set scheduler configuration.
    pub fn scheduler(mut self, config: SchedulerConfig) -> Self {
        self.config.scheduler = config;
        self
    }

    /// Set notifier configuration.
    pub fn notifier(mut self, config: NotifierConfig) -> Self {
        self.config.notifier = config;
        self
    }

    /// Set the daily summary time.
    pub fn daily_summary_time(mut self, time: NaiveTime) -> Self {
        self.config.scheduler.daily_summary_time = time;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> LexicardResult<LexicardConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
