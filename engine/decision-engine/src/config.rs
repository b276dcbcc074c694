use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Configuration for the decision engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// League backend configuration
    pub source: SourceConfig,

    /// Progressive loading configuration
    pub loader: LoaderConfig,

    /// Cache TTLs per data category
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the league backend
    pub base_url: String,

    /// League to analyze
    pub league_id: String,

    /// Bearer session token issued by the league login flow
    #[serde(skip_serializing)]
    pub session_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Weeks in a regular season
    pub season_weeks: u32,

    /// Weeks per follow-up request
    pub chunk_size: u32,

    /// Delay before each upstream call in milliseconds
    pub request_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub season_ttl_secs: u64,
    pub weekly_ttl_secs: u64,
    pub league_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Log format (text, json, pretty)
    pub format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            league_id: String::new(),
            session_token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            season_weeks: 17,
            chunk_size: 5,
            request_delay_ms: 100,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            season_ttl_secs: 30 * 60,
            weekly_ttl_secs: 15 * 60,
            league_ttl_secs: 60 * 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FANTASY_API_BASE_URL") {
            config.source.base_url = url;
        }

        if let Ok(league_id) = std::env::var("FANTASY_LEAGUE_ID") {
            config.source.league_id = league_id;
        }

        if let Ok(token) = std::env::var("FANTASY_SESSION_TOKEN") {
            if !token.trim().is_empty() {
                config.source.session_token = Some(token);
            }
        }

        if let Ok(weeks) = std::env::var("FANTASY_SEASON_WEEKS") {
            config.loader.season_weeks = weeks.parse().unwrap_or(17);
        }

        if let Ok(size) = std::env::var("FANTASY_CHUNK_SIZE") {
            config.loader.chunk_size = size.parse().unwrap_or(5);
        }

        if let Ok(delay) = std::env::var("FANTASY_REQUEST_DELAY_MS") {
            config.loader.request_delay_ms = delay.parse().unwrap_or(100);
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.loader.chunk_size == 0 {
            return Err("loader.chunk_size must be at least 1".to_string().into());
        }
        if self.loader.season_weeks == 0 {
            return Err("loader.season_weeks must be at least 1".to_string().into());
        }
        if self.source.base_url.trim().is_empty() {
            return Err("source.base_url must not be empty".to_string().into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.loader.request_delay_ms)
    }
}
