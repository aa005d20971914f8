//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SPIELPLAN_*)
//! 2. TOML config file (if SPIELPLAN_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SPIELPLAN_*)
/// 2. TOML config file (if SPIELPLAN_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared secret clients must present in the X-API-Key header.
    ///
    /// Set via SPIELPLAN_API_KEY environment variable.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Directory for cached bodies, sidecar metadata, and the snapshot file.
    ///
    /// Set via SPIELPLAN_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// TTL for game-list caches in seconds.
    #[serde(default = "default_ttl_games")]
    pub ttl_games_secs: u64,

    /// TTL for league-table caches in seconds.
    #[serde(default = "default_ttl_table")]
    pub ttl_table_secs: u64,

    /// TTL for club team-list caches in seconds.
    #[serde(default = "default_ttl_teams")]
    pub ttl_teams_secs: u64,

    /// TTL for font-asset caches in seconds. Font assets rotate far less
    /// often than page content, hence the much longer default.
    #[serde(default = "default_ttl_font")]
    pub ttl_font_secs: u64,

    /// Maximum number of in-memory HTTP cache entries. A size safety valve;
    /// freshness is governed by the TTLs above.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// If set, proactively caches all data for this club ID.
    ///
    /// Set via SPIELPLAN_PREWARM_CLUB_ID environment variable.
    #[serde(default)]
    pub prewarm_club_id: Option<String>,

    /// Interval for the pre-warming job in seconds.
    #[serde(default = "default_prewarm_interval")]
    pub prewarm_interval_secs: u64,

    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Outbound HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_key() -> String {
    "your-secret-api-key".into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache_payloads")
}

fn default_ttl_games() -> u64 {
    900 // 15 minutes
}

fn default_ttl_table() -> u64 {
    3600 // 1 hour
}

fn default_ttl_teams() -> u64 {
    7200 // 2 hours
}

fn default_ttl_font() -> u64 {
    86_400 // 24 hours
}

fn default_max_entries() -> usize {
    1024
}

fn default_prewarm_interval() -> u64 {
    300 // 5 minutes
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_user_agent() -> String {
    "spielplan/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            cache_dir: default_cache_dir(),
            ttl_games_secs: default_ttl_games(),
            ttl_table_secs: default_ttl_table(),
            ttl_teams_secs: default_ttl_teams(),
            ttl_font_secs: default_ttl_font(),
            max_entries: default_max_entries(),
            prewarm_club_id: None,
            prewarm_interval_secs: default_prewarm_interval(),
            bind_addr: default_bind_addr(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Per-data-class cache TTLs handed to the crawler.
#[derive(Debug, Clone, Copy)]
pub struct TtlConfig {
    pub games: Duration,
    pub table: Duration,
    pub teams: Duration,
    pub font: Duration,
}

impl AppConfig {
    /// Outbound request timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The per-data-class TTLs as Durations.
    pub fn ttls(&self) -> TtlConfig {
        TtlConfig {
            games: Duration::from_secs(self.ttl_games_secs),
            table: Duration::from_secs(self.ttl_table_secs),
            teams: Duration::from_secs(self.ttl_teams_secs),
            font: Duration::from_secs(self.ttl_font_secs),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SPIELPLAN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SPIELPLAN_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("./cache_payloads"));
        assert_eq!(config.ttl_games_secs, 900);
        assert_eq!(config.ttl_table_secs, 3600);
        assert_eq!(config.ttl_teams_secs, 7200);
        assert_eq!(config.ttl_font_secs, 86_400);
        assert_eq!(config.max_entries, 1024);
        assert!(config.prewarm_club_id.is_none());
        assert_eq!(config.prewarm_interval_secs, 300);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_ttls() {
        let ttls = AppConfig::default().ttls();
        assert_eq!(ttls.games, Duration::from_secs(900));
        assert_eq!(ttls.font, Duration::from_secs(86_400));
    }
}
