//! Application configuration.
//!
//! Scheduling constants are defaults that `config.toml` can override. The
//! ease-factor floor is not configurable; it lives with the review record.

use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::MIN_EASE_FACTOR;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ==================== File Structure ====================

/// Configuration file structure for config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub srs: SrsConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SERVER_ADDR.to_string(),
            port: SERVER_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle sessions older than this are dropped from the registry
    pub expiry_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_hours: SESSION_EXPIRY_HOURS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&self.expiry_hours) {
            return Err(ConfigError::Invalid(format!(
                "sessions.expiry_hours must be between 1 and {}",
                MAX_SESSION_EXPIRY_HOURS
            )));
        }
        Ok(())
    }
}

// ==================== SRS Configuration ====================

/// Learning steps in minutes: 1min → 10min, then graduate
pub const LEARNING_STEPS: [i64; 2] = [1, 10];

/// Longest accepted learning step (one week)
pub const MAX_LEARNING_STEP_MINUTES: i64 = 7 * 24 * 60;

/// Largest accepted review interval cap (1000 years)
pub const MAX_INTERVAL_DAYS_LIMIT: u32 = 365_000;

/// Scheduling constants for the SM-2 scheduler and session limits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SrsConfig {
    pub learning_steps_minutes: Vec<i64>,
    pub starting_ease: f64,
    pub lapse_ease_penalty: f64,
    pub hard_ease_penalty: f64,
    pub easy_ease_bonus: f64,
    pub hard_interval_multiplier: f64,
    pub easy_interval_multiplier: f64,
    pub graduating_interval_days: u32,
    pub easy_graduating_interval_days: u32,
    /// Upper bound on review intervals
    pub max_interval_days: u32,
    /// How many other items a card graded AGAIN waits behind in the session
    pub requeue_gap: usize,
    pub new_per_session: usize,
    pub review_per_session: usize,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            learning_steps_minutes: LEARNING_STEPS.to_vec(),
            starting_ease: 2.5,
            lapse_ease_penalty: 0.20,
            hard_ease_penalty: 0.15,
            easy_ease_bonus: 0.15,
            hard_interval_multiplier: 1.2,
            easy_interval_multiplier: 1.3,
            graduating_interval_days: 1,
            easy_graduating_interval_days: 4,
            max_interval_days: 36_500,
            requeue_gap: 3,
            new_per_session: 20,
            review_per_session: 200,
        }
    }
}

impl SrsConfig {
    /// Number of rungs on the learning ladder
    pub fn step_count(&self) -> usize {
        self.learning_steps_minutes.len()
    }

    /// Duration of the given learning step, if it exists
    pub fn step_duration(&self, step: u32) -> Option<Duration> {
        self.learning_steps_minutes
            .get(step as usize)
            .and_then(|minutes| Duration::try_minutes(*minutes))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.learning_steps_minutes.is_empty() {
            return Err(ConfigError::Invalid("learning_steps_minutes is empty".into()));
        }
        if self
            .learning_steps_minutes
            .iter()
            .any(|m| *m <= 0 || *m > MAX_LEARNING_STEP_MINUTES)
        {
            return Err(ConfigError::Invalid(format!(
                "learning_steps_minutes must be between 1 and {}",
                MAX_LEARNING_STEP_MINUTES
            )));
        }
        if !self.starting_ease.is_finite() || self.starting_ease < MIN_EASE_FACTOR {
            return Err(ConfigError::Invalid(format!(
                "starting_ease {} is below {}",
                self.starting_ease, MIN_EASE_FACTOR
            )));
        }
        let deltas = [
            ("lapse_ease_penalty", self.lapse_ease_penalty),
            ("hard_ease_penalty", self.hard_ease_penalty),
            ("easy_ease_bonus", self.easy_ease_bonus),
        ];
        for (name, value) in deltas {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be >= 0", name)));
            }
        }
        let multipliers = [
            ("hard_interval_multiplier", self.hard_interval_multiplier),
            ("easy_interval_multiplier", self.easy_interval_multiplier),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value < 1.0 {
                return Err(ConfigError::Invalid(format!("{} must be >= 1", name)));
            }
        }
        if self.graduating_interval_days == 0 || self.easy_graduating_interval_days == 0 {
            return Err(ConfigError::Invalid(
                "graduating intervals must be at least one day".into(),
            ));
        }
        if self.max_interval_days > MAX_INTERVAL_DAYS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_interval_days must be at most {}",
                MAX_INTERVAL_DAYS_LIMIT
            )));
        }
        if self.max_interval_days < self.easy_graduating_interval_days.max(self.graduating_interval_days) {
            return Err(ConfigError::Invalid(
                "max_interval_days is shorter than a graduating interval".into(),
            ));
        }
        if self.requeue_gap == 0 {
            return Err(ConfigError::Invalid("requeue_gap must be at least 1".into()));
        }
        Ok(())
    }
}

// ==================== Loading ====================

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.srs.validate()?;
        config.sessions.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Load config.toml from the working directory, falling back to defaults
pub fn load_config() -> AppConfig {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        tracing::info!("No {} found, using default configuration", CONFIG_FILE);
        return AppConfig::default();
    }

    match AppConfig::from_file(path) {
        Ok(config) => {
            tracing::info!("Loaded configuration from {}", CONFIG_FILE);
            config
        }
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", CONFIG_FILE, e);
            AppConfig::default()
        }
    }
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path(config: &AppConfig) -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    if let Some(path) = &config.database.path {
        tracing::info!("Using database from config.toml: {}", path);
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    let default = PathBuf::from(DEFAULT_DB_PATH);
    tracing::info!("Using default database path: {}", default.display());
    default
}

// ==================== Server Configuration ====================

pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_DB_PATH: &str = "data/study.db";

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Get the full server bind address
pub fn server_bind_addr(config: &ServerConfig) -> String {
    format!("{}:{}", config.addr, config.port)
}

// ==================== Session Configuration ====================

/// Session expiration time in hours
pub const SESSION_EXPIRY_HOURS: i64 = 1;

/// Longest accepted session expiry (one week)
pub const MAX_SESSION_EXPIRY_HOURS: i64 = 7 * 24;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;
