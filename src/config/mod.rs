#[cfg(feature = "cli")]
pub mod cli;
pub mod credentials;

use crate::domain::model::PostMode;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

const MAX_RETENTION_DAYS: i64 = 36_500;
const MAX_FRESHNESS_HOURS: i64 = 876_000;

const LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub max_retries: u32,
    pub retry_multiplier: u64,
    pub min_retry_wait: u64,
    pub max_retry_wait: u64,
    pub history_retention_days: i64,
    pub article_freshness_hours: i64,
    pub max_feeds_per_run: usize,
    pub max_articles_per_feed: usize,
    pub log_level: String,
    pub log_file: Option<String>,
    pub json_logs: bool,
    pub post_mode: PostMode,
    pub max_tweet_length: usize,
    pub feeds_file: String,
    pub history_file: String,
    pub feed_timeout_seconds: u64,
    pub xai: XaiConfig,
    pub twitter: TwitterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XaiConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_multiplier: 1,
            min_retry_wait: 4,
            max_retry_wait: 10,
            history_retention_days: 30,
            article_freshness_hours: 24,
            max_feeds_per_run: 25,
            max_articles_per_feed: 5,
            log_level: "INFO".to_string(),
            log_file: Some("twitter_bot.log".to_string()),
            json_logs: false,
            post_mode: PostMode::Single,
            max_tweet_length: 280,
            feeds_file: "rss".to_string(),
            history_file: "posted_articles.json".to_string(),
            feed_timeout_seconds: 30,
            xai: XaiConfig::default(),
            twitter: TwitterConfig::default(),
        }
    }
}

impl Default for XaiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.x.ai/v1".to_string(),
            model: "grok-beta".to_string(),
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com/2".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Exponential backoff settings for the chat client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl RetryPolicy {
    /// Wait after the given failed attempt (1-based): `multiplier * 2^(n-1)`,
    /// clamped to `[min_wait, max_wait]`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
        let raw = self.multiplier.saturating_mul(exp);
        raw.clamp(self.min_wait, self.max_wait.max(self.min_wait))
    }

    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            multiplier: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }
}

impl BotConfig {
    /// Loads the config file, or returns defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            multiplier: Duration::from_secs(self.retry_multiplier),
            min_wait: Duration::from_secs(self.min_retry_wait),
            max_wait: Duration::from_secs(self.max_retry_wait),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("xai.base_url", &self.xai.base_url)?;
        validation::validate_url("twitter.base_url", &self.twitter.base_url)?;
        validation::validate_path("feeds_file", &self.feeds_file)?;
        validation::validate_path("history_file", &self.history_file)?;
        if let Some(log_file) = &self.log_file {
            validation::validate_path("log_file", log_file)?;
        }

        validation::validate_positive_number("max_retries", u64::from(self.max_retries), 1)?;
        validation::validate_range(
            "history_retention_days",
            self.history_retention_days,
            1,
            MAX_RETENTION_DAYS,
        )?;
        validation::validate_range(
            "article_freshness_hours",
            self.article_freshness_hours,
            1,
            MAX_FRESHNESS_HOURS,
        )?;
        validation::validate_positive_number("max_feeds_per_run", self.max_feeds_per_run as u64, 1)?;
        validation::validate_positive_number(
            "max_articles_per_feed",
            self.max_articles_per_feed as u64,
            1,
        )?;
        validation::validate_range("max_tweet_length", self.max_tweet_length, 20, 25_000)?;
        validation::validate_positive_number("xai.timeout_seconds", self.xai.timeout_seconds, 1)?;
        validation::validate_positive_number(
            "twitter.timeout_seconds",
            self.twitter.timeout_seconds,
            1,
        )?;
        validation::validate_positive_number("feed_timeout_seconds", self.feed_timeout_seconds, 1)?;
        validation::validate_range("xai.temperature", self.xai.temperature, 0.0, 2.0)?;
        validation::validate_one_of("log_level", &self.log_level, LOG_LEVELS)?;

        if self.min_retry_wait > self.max_retry_wait {
            return Err(BotError::InvalidConfigValueError {
                field: "min_retry_wait".to_string(),
                value: self.min_retry_wait.to_string(),
                reason: format!("must not exceed max_retry_wait ({})", self.max_retry_wait),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for BotConfig {
    fn article_freshness_hours(&self) -> i64 {
        self.article_freshness_hours
    }

    fn history_retention_days(&self) -> i64 {
        self.history_retention_days
    }

    fn max_feeds_per_run(&self) -> usize {
        self.max_feeds_per_run
    }

    fn max_articles_per_feed(&self) -> usize {
        self.max_articles_per_feed
    }

    fn max_tweet_length(&self) -> usize {
        self.max_tweet_length
    }

    fn post_mode(&self) -> PostMode {
        self.post_mode
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
