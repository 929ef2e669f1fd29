//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.marquee/config.toml` (user)
//! 3. `/etc/marquee/config.toml` (system)
//! 4. built-in defaults
//!
//! The OMDb API key may also come from the `OMDB_API_KEY` environment
//! variable, which takes precedence over the file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::RatingCacheConfig;
use crate::coordinator::DEFAULT_MAX_CONCURRENT_LOOKUPS;
use crate::dispatch::DispatchConfig;
use crate::providers::RetryConfig;
use crate::{MarqueeError, Result};

/// Environment variable holding the OMDb API key.
pub const OMDB_API_KEY_ENV: &str = "OMDB_API_KEY";

const DAY_SECS: u64 = 24 * 3600;

/// Engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub lookup: LookupSection,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub retry: RetrySection,
}

/// Rating cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Lifetime of a found rating in days (default: 7).
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,
    /// Lifetime of a "no rating" tombstone in days (default: 7).
    #[serde(default = "default_ttl_days")]
    pub missing_ttl_days: u64,
    /// Persist after every N writes (default: 10, 0 = only on explicit flush).
    #[serde(default = "default_flush_every")]
    pub flush_every: u64,
    /// Directory for the persisted cache (default: `~/.cache/marquee`).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
            missing_ttl_days: default_ttl_days(),
            flush_every: default_flush_every(),
            dir: None,
        }
    }
}

fn default_ttl_days() -> u64 {
    7
}

fn default_flush_every() -> u64 {
    10
}

impl CacheSection {
    pub fn to_cache_config(&self) -> RatingCacheConfig {
        RatingCacheConfig::new()
            .ttl(days(self.ttl_days))
            .missing_ttl(days(self.missing_ttl_days))
            .flush_every(self.flush_every)
    }
}

fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(DAY_SECS))
}

/// Secondary-provider pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSection {
    /// Minimum gap between scrapes in milliseconds (default: 2000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Random extra gap upper bound in milliseconds (default: 1500).
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_jitter_ms() -> u64 {
    1500
}

impl DispatchSection {
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::new()
            .base_delay(Duration::from_millis(self.base_delay_ms))
            .max_jitter(Duration::from_millis(self.jitter_ms))
    }
}

/// Lookup concurrency.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupSection {
    /// Maximum lookup chains running at once (default: 3).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for LookupSection {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT_LOOKUPS
}

/// Provider configurations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub omdb: Option<OmdbConfig>,
    #[serde(default)]
    pub rotten_tomatoes: Option<RottenTomatoesConfig>,
    /// HTTP timeout for both providers in seconds (default: 30).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// OMDb settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Rotten Tomatoes settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RottenTomatoesConfig {
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Primary-provider retry settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts including the first (default: 2).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds (default: 500).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    500
}

impl RetrySection {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.max_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.marquee/config.toml`
    /// 3. `/etc/marquee/config.toml`
    /// 4. Defaults, if neither file exists
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MarqueeError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MarqueeError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `None` means use defaults.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MarqueeError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".marquee").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/marquee/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// OMDb key: environment first, then the config file.
    pub fn omdb_api_key(&self) -> Option<String> {
        std::env::var(OMDB_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.providers.omdb.as_ref()?.api_key.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.providers.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_days, 7);
        assert_eq!(config.cache.missing_ttl_days, 7);
        assert_eq!(config.cache.flush_every, 10);
        assert_eq!(config.dispatch.base_delay_ms, 2000);
        assert_eq!(config.dispatch.jitter_ms, 1500);
        assert_eq!(config.lookup.max_concurrent, 3);
        assert_eq!(config.retry.max_attempts, 2);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [cache]
            ttl_days = 3
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.ttl_days, 3);
        // Defaults preserved
        assert_eq!(config.cache.missing_ttl_days, 7);
        assert_eq!(config.dispatch.base_delay_ms, 2000);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [cache]
            ttl_days = 14
            missing_ttl_days = 1
            flush_every = 5
            dir = "/var/cache/marquee"

            [dispatch]
            base_delay_ms = 3000
            jitter_ms = 0

            [lookup]
            max_concurrent = 8

            [providers]
            timeout_secs = 10

            [providers.omdb]
            base_url = "http://localhost:8080"
            api_key = "abc123"

            [providers.rotten_tomatoes]
            base_url = "http://localhost:8081"

            [retry]
            max_attempts = 4
            initial_delay_ms = 250
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.flush_every, 5);
        assert_eq!(config.cache.dir, Some(PathBuf::from("/var/cache/marquee")));
        assert_eq!(config.lookup.max_concurrent, 8);
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(
            config.providers.omdb.as_ref().unwrap().base_url.as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(
            config
                .providers
                .rotten_tomatoes
                .as_ref()
                .unwrap()
                .base_url
                .as_deref(),
            Some("http://localhost:8081")
        );

        let cache = config.cache.to_cache_config();
        assert_eq!(cache.ttl, Duration::from_secs(14 * DAY_SECS));
        assert_eq!(cache.missing_ttl, Duration::from_secs(DAY_SECS));
        assert_eq!(cache.flush_every, 5);

        let dispatch = config.dispatch.to_dispatch_config();
        assert_eq!(dispatch.next_delay(), Duration::from_millis(3000));

        let retry = config.retry.to_retry_config();
        assert_eq!(retry.max_attempts, 4);
        assert_eq!(retry.initial_delay, Duration::from_millis(250));
    }

    #[test]
    fn huge_ttl_saturates() {
        let config: Config = toml::from_str("[cache]\nttl_days = 9223372036854775807").unwrap();
        let cache = config.cache.to_cache_config();
        assert_eq!(cache.ttl, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn unknown_value_type_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[cache]\nttl_days = \"a week\"");
        assert!(result.is_err());
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[lookup]\nmax_concurrent = 1\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.lookup.max_concurrent, 1);
    }
}
