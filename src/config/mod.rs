//! Configuration management for tour-roster
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::notifications::{ExpoConfig, MAX_BATCH_SIZE};
use crate::notifications::channels::expo::DEFAULT_EXPO_ENDPOINT;
use crate::scheduler::SlotTimes;
use crate::server::ServerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Push notification configuration
    #[serde(default)]
    pub push: PushConfig,

    /// Roster rules
    #[serde(default)]
    pub roster: RosterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    /// Seeded in-process store, nothing persisted
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown database backend: {other}")),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: DatabaseBackend,

    /// PostgreSQL connection string
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_database_url() -> String {
    String::from("postgresql://localhost/tour_roster")
}

fn default_pool_size() -> usize {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            url: default_database_url(),
            pool_size: default_pool_size(),
        }
    }
}

/// Push notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Send to the gateway; when off, messages are only logged
    #[serde(default = "default_push_enabled")]
    pub enabled: bool,

    /// Push endpoint URL
    #[serde(default = "default_push_endpoint")]
    pub endpoint: String,

    /// Optional gateway access token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_push_timeout")]
    pub timeout_secs: u64,

    /// Messages per gateway request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_push_enabled() -> bool {
    true
}

fn default_push_endpoint() -> String {
    DEFAULT_EXPO_ENDPOINT.to_string()
}

fn default_push_timeout() -> u64 {
    10
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: default_push_enabled(),
            endpoint: default_push_endpoint(),
            access_token: None,
            timeout_secs: default_push_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

impl PushConfig {
    /// Channel configuration for the Expo gateway
    pub fn expo_config(&self) -> ExpoConfig {
        ExpoConfig {
            endpoint: self.endpoint.clone(),
            access_token: self.access_token.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Roster rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Start of the daily morning tour
    #[serde(default = "default_morning")]
    pub morning: NaiveTime,

    /// Start of the optional afternoon tour
    #[serde(default = "default_afternoon")]
    pub afternoon: NaiveTime,

    /// Length of the history window shown next to each guide
    #[serde(default = "default_history_months")]
    pub history_months: u32,
}

fn default_morning() -> NaiveTime {
    SlotTimes::default().morning
}

fn default_afternoon() -> NaiveTime {
    SlotTimes::default().afternoon
}

fn default_history_months() -> u32 {
    6
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            morning: default_morning(),
            afternoon: default_afternoon(),
            history_months: default_history_months(),
        }
    }
}

impl RosterConfig {
    pub fn slot_times(&self) -> SlotTimes {
        SlotTimes {
            morning: self.morning,
            afternoon: self.afternoon,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("text")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_time(key: &str) -> Option<NaiveTime> {
    let raw = std::env::var(key).ok()?;
    parse_clock_time(raw.trim())
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse `token:user,token:user`
fn parse_api_keys(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, user) = pair.split_once(':')?;
            let (token, user) = (token.trim(), user.trim());
            (!token.is_empty() && !user.is_empty()).then(|| (token.to_string(), user.to_string()))
        })
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_address = match std::env::var("TOUR_ROSTER_BIND") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("Invalid TOUR_ROSTER_BIND: {raw}"))?,
            Err(_) => defaults.server.bind_address,
        };

        let api_keys = std::env::var("TOUR_ROSTER_API_KEYS")
            .map(|raw| parse_api_keys(&raw))
            .unwrap_or_default();

        let backend = match std::env::var("TOUR_ROSTER_DB_BACKEND") {
            Ok(raw) => raw.parse::<DatabaseBackend>().map_err(anyhow::Error::msg)?,
            Err(_) => DatabaseBackend::default(),
        };

        let url = std::env::var("TOUR_ROSTER_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| default_database_url());

        Ok(Self {
            server: ServerConfig {
                bind_address,
                enable_cors: env_parse("TOUR_ROSTER_CORS").unwrap_or(true),
                enable_request_logging: env_parse("TOUR_ROSTER_REQUEST_LOGGING").unwrap_or(true),
                api_keys,
            },
            database: DatabaseConfig {
                backend,
                url,
                pool_size: env_parse("TOUR_ROSTER_DB_POOL_SIZE").unwrap_or_else(default_pool_size),
            },
            push: PushConfig {
                enabled: env_parse("TOUR_ROSTER_PUSH_ENABLED").unwrap_or(true),
                endpoint: std::env::var("TOUR_ROSTER_PUSH_ENDPOINT")
                    .unwrap_or_else(|_| default_push_endpoint()),
                access_token: std::env::var("EXPO_ACCESS_TOKEN").ok(),
                timeout_secs: env_parse("TOUR_ROSTER_PUSH_TIMEOUT")
                    .unwrap_or_else(default_push_timeout),
                batch_size: env_parse("TOUR_ROSTER_PUSH_BATCH_SIZE")
                    .unwrap_or_else(default_batch_size),
            },
            roster: RosterConfig {
                morning: env_time("TOUR_ROSTER_MORNING").unwrap_or_else(default_morning),
                afternoon: env_time("TOUR_ROSTER_AFTERNOON").unwrap_or_else(default_afternoon),
                history_months: env_parse("TOUR_ROSTER_HISTORY_MONTHS")
                    .unwrap_or_else(default_history_months),
            },
            logging: LoggingConfig {
                level: std::env::var("TOUR_ROSTER_LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
                format: std::env::var("TOUR_ROSTER_LOG_FORMAT")
                    .unwrap_or_else(|_| default_log_format()),
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise from the environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.server
            .validate()
            .map_err(|e| anyhow::anyhow!("server: {e}"))?;

        if self.database.pool_size == 0 {
            anyhow::bail!("pool_size must be greater than 0");
        }

        if self.database.backend == DatabaseBackend::Postgres && self.database.url.trim().is_empty() {
            anyhow::bail!("database url is required for the postgres backend");
        }

        if self.push.batch_size == 0 || self.push.batch_size > MAX_BATCH_SIZE {
            anyhow::bail!("push batch_size must be between 1 and {MAX_BATCH_SIZE}");
        }

        if self.push.enabled {
            self.push
                .expo_config()
                .validate()
                .map_err(|e| anyhow::anyhow!("push: {e}"))?;
        }

        self.roster
            .slot_times()
            .validate()
            .map_err(|e| anyhow::anyhow!("roster: {e}"))?;

        if self.roster.history_months == 0 {
            anyhow::bail!("history_months must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }
}
