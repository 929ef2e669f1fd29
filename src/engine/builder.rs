//! Builder for configuring engine instances

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::RatingEngine;
use crate::blocklist::Blocklist;
use crate::cache::{FileStore, KeyValueStore, MemoryStore, RatingCache, RatingCacheConfig};
use crate::chain::LookupChain;
use crate::config::Config;
use crate::coordinator::{DEFAULT_MAX_CONCURRENT_LOOKUPS, RequestCoordinator};
use crate::dispatch::{DispatchConfig, RateLimitedDispatcher};
use crate::providers::omdb::{self, OmdbClient};
use crate::providers::rotten_tomatoes::{self, RottenTomatoesClient};
use crate::providers::{
    PrimaryProvider, RetryConfig, RetryingPrimaryProvider, ScoreParser, SecondaryProvider,
};
use crate::{MarqueeError, Result};

/// Main entry point for creating engine instances.
pub struct Marquee;

impl Marquee {
    /// Create a new builder for configuring the engine.
    pub fn builder() -> MarqueeBuilder {
        MarqueeBuilder::new()
    }
}

/// Builder for configuring engine instances.
pub struct MarqueeBuilder {
    omdb_key: Option<String>,
    omdb_url: Option<String>,
    rotten_tomatoes_url: Option<String>,
    primary: Option<Arc<dyn PrimaryProvider>>,
    secondary: Option<Arc<dyn SecondaryProvider>>,
    score_parser: Option<Arc<dyn ScoreParser>>,
    store: Option<Arc<dyn KeyValueStore>>,
    cache_dir: Option<PathBuf>,
    cache_config: RatingCacheConfig,
    dispatch_config: DispatchConfig,
    retry_config: RetryConfig,
    max_concurrent_lookups: usize,
    timeout: Option<Duration>,
    blocklist: Option<Vec<String>>,
}

impl MarqueeBuilder {
    pub fn new() -> Self {
        Self {
            omdb_key: None,
            omdb_url: None,
            rotten_tomatoes_url: None,
            primary: None,
            secondary: None,
            score_parser: None,
            store: None,
            cache_dir: None,
            cache_config: RatingCacheConfig::default(),
            dispatch_config: DispatchConfig::default(),
            retry_config: RetryConfig::default(),
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
            timeout: None,
            blocklist: None,
        }
    }

    /// Seed a builder from loaded configuration.
    ///
    /// The cache is persisted to `cache.dir`, or `~/.cache/marquee` when
    /// unset.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .cache_config(config.cache.to_cache_config())
            .dispatch_config(config.dispatch.to_dispatch_config())
            .retry_config(config.retry.to_retry_config())
            .max_concurrent_lookups(config.lookup.max_concurrent)
            .cache_dir(
                config
                    .cache
                    .dir
                    .clone()
                    .unwrap_or_else(FileStore::default_dir),
            );
        if let Some(key) = config.omdb_api_key() {
            builder = builder.omdb(key);
        }
        if let Some(url) = config.providers.omdb.as_ref().and_then(|c| c.base_url.clone()) {
            builder = builder.omdb_base_url(url);
        }
        if let Some(url) = config
            .providers
            .rotten_tomatoes
            .as_ref()
            .and_then(|c| c.base_url.clone())
        {
            builder = builder.rotten_tomatoes_base_url(url);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// Set the OMDb API key (default: the public `trilogy` key).
    pub fn omdb(mut self, api_key: impl Into<String>) -> Self {
        self.omdb_key = Some(api_key.into());
        self
    }

    /// Point the OMDb client at a different host.
    pub fn omdb_base_url(mut self, url: impl Into<String>) -> Self {
        self.omdb_url = Some(url.into());
        self
    }

    /// Point the Rotten Tomatoes scraper at a different host.
    pub fn rotten_tomatoes_base_url(mut self, url: impl Into<String>) -> Self {
        self.rotten_tomatoes_url = Some(url.into());
        self
    }

    /// Replace the primary provider. It is still wrapped with retries.
    pub fn primary_provider(mut self, provider: Arc<dyn PrimaryProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    /// Replace the secondary provider.
    pub fn secondary_provider(mut self, provider: Arc<dyn SecondaryProvider>) -> Self {
        self.secondary = Some(provider);
        self
    }

    /// Use a different detail-page parser for the built-in scraper.
    pub fn score_parser(mut self, parser: Arc<dyn ScoreParser>) -> Self {
        self.score_parser = Some(parser);
        self
    }

    /// Persist the cache and read the block-list through `store`.
    ///
    /// Takes precedence over [`cache_dir`](Self::cache_dir). Without either,
    /// state lives only in memory.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist to a [`FileStore`] in `dir`.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn cache_config(mut self, config: RatingCacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatch_config = config;
        self
    }

    /// Retry policy for the primary provider. Use
    /// [`RetryConfig::disabled`] for a single attempt.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Maximum lookup chains running at once (default: 3).
    pub fn max_concurrent_lookups(mut self, n: usize) -> Self {
        self.max_concurrent_lookups = n;
        self
    }

    /// HTTP timeout for the built-in providers (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a fixed block-list instead of the persisted one.
    pub fn blocklist<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocklist = Some(entries.into_iter().map(Into::into).collect());
        self
    }

    /// Build the engine, loading the persisted cache and block-list.
    pub async fn build(self) -> Result<RatingEngine> {
        if self.max_concurrent_lookups == 0 {
            return Err(MarqueeError::Configuration(
                "max_concurrent_lookups must be at least 1".to_string(),
            ));
        }

        let timeout = self.timeout.unwrap_or(omdb::DEFAULT_TIMEOUT);

        let store: Arc<dyn KeyValueStore> = match (self.store, self.cache_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Arc::new(FileStore::new(dir)),
            (None, None) => Arc::new(MemoryStore::new()),
        };

        let primary: Arc<dyn PrimaryProvider> = match self.primary {
            Some(provider) => provider,
            None => Arc::new(OmdbClient::with_timeout(
                self.omdb_key
                    .unwrap_or_else(|| omdb::DEFAULT_API_KEY.to_string()),
                self.omdb_url
                    .unwrap_or_else(|| omdb::DEFAULT_BASE_URL.to_string()),
                timeout,
            )?),
        };
        let primary: Arc<dyn PrimaryProvider> =
            Arc::new(RetryingPrimaryProvider::new(primary, self.retry_config));

        let secondary = match self.secondary {
            Some(provider) => provider,
            None => {
                let mut client = RottenTomatoesClient::with_timeout(
                    self.rotten_tomatoes_url
                        .unwrap_or_else(|| rotten_tomatoes::DEFAULT_BASE_URL.to_string()),
                    timeout,
                )?;
                if let Some(parser) = self.score_parser {
                    client = client.with_parser(parser);
                }
                Arc::new(client) as Arc<dyn SecondaryProvider>
            }
        };

        let dispatcher = RateLimitedDispatcher::new(secondary, self.dispatch_config);
        let chain = LookupChain::new(primary, dispatcher.clone());
        let cache = Arc::new(RatingCache::load(Arc::clone(&store), self.cache_config).await);
        let blocklist = match self.blocklist {
            Some(entries) => Blocklist::from_entries(entries),
            None => Blocklist::load(store).await,
        };
        let coordinator =
            RequestCoordinator::new(Arc::clone(&cache), chain, self.max_concurrent_lookups);

        Ok(RatingEngine::new(
            coordinator,
            cache,
            Arc::new(blocklist),
            dispatcher,
        ))
    }
}

impl Default for MarqueeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
