//! Single-flight request coordination.
//!
//! [`RequestCoordinator::resolve`] is the cache-then-lookup path. For any
//! title key at most one [`LookupChain`] execution is in progress: callers
//! arriving while one runs await the same shared future instead of starting
//! another.
//!
//! The cache check, the in-flight check, and registration all happen under
//! one short, synchronous lock. The shared lookup writes the cache *before*
//! removing itself from the in-flight table, so a caller that takes the
//! lock after removal always sees the cached outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::cache::RatingCache;
use crate::chain::{LookupChain, LookupOutcome, PrimaryPass};
use crate::telemetry;
use crate::title::TitleKey;
use crate::types::RatingResult;
use crate::{MarqueeError, Result};

/// Default number of titles whose primary pass may run at once.
pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 3;

type SharedLookup = Shared<BoxFuture<'static, Result<Option<RatingResult>>>>;

struct CoordinatorInner {
    cache: Arc<RatingCache>,
    chain: LookupChain,
    in_flight: Mutex<HashMap<TitleKey, SharedLookup>>,
    permits: Semaphore,
}

impl CoordinatorInner {
    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<TitleKey, SharedLookup>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache check, request deduplication, and cache write-back.
#[derive(Clone)]
pub struct RequestCoordinator {
    inner: Arc<CoordinatorInner>,
}

enum Plan {
    Cached(Option<RatingResult>),
    Await(SharedLookup),
}

impl RequestCoordinator {
    pub fn new(cache: Arc<RatingCache>, chain: LookupChain, max_concurrent_lookups: usize) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                cache,
                chain,
                in_flight: Mutex::new(HashMap::new()),
                permits: Semaphore::new(max_concurrent_lookups.max(1)),
            }),
        }
    }

    /// Resolve `title` to a rating, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// [`MarqueeError::InvalidInput`] for a blank title. Provider failures
    /// never surface here; they resolve to `None` and are not cached.
    pub async fn resolve(&self, title: &str) -> Result<Option<RatingResult>> {
        if title.trim().is_empty() {
            return Err(MarqueeError::InvalidInput("title is empty".into()));
        }
        let key = TitleKey::new(title);

        let plan = {
            let mut in_flight = self.inner.lock_in_flight();
            if let Some(entry) = self.inner.cache.get_by_key(&key) {
                debug!(title, missing = entry.is_missing(), "cache hit");
                Plan::Cached(entry.into_result())
            } else if let Some(pending) = in_flight.get(&key) {
                debug!(title, "joining in-flight lookup");
                metrics::counter!(telemetry::DEDUP_JOINS_TOTAL).increment(1);
                Plan::Await(pending.clone())
            } else {
                let lookup = run(Arc::clone(&self.inner), key.clone(), title.to_string())
                    .boxed()
                    .shared();
                in_flight.insert(key, lookup.clone());
                Plan::Await(lookup)
            }
        };

        match plan {
            Plan::Cached(result) => Ok(result),
            Plan::Await(lookup) => lookup.await,
        }
    }

    /// Number of lookups currently in progress.
    pub fn in_flight(&self) -> usize {
        self.inner.lock_in_flight().len()
    }
}

/// Body of one shared lookup. Removes its in-flight entry on every path.
async fn run(inner: Arc<CoordinatorInner>, key: TitleKey, title: String) -> Result<Option<RatingResult>> {
    let outcome = execute(&inner, &title).await;
    inner.lock_in_flight().remove(&key);
    outcome
}

/// The permit covers the primary pass only. The secondary pass waits on the
/// dispatcher queue, and a stalled scrape holds up only its own title.
async fn execute(inner: &CoordinatorInner, title: &str) -> Result<Option<RatingResult>> {
    let start = Instant::now();
    let pass = {
        let _permit = inner
            .permits
            .acquire()
            .await
            .map_err(|_| MarqueeError::ShutDown("lookup limiter"))?;
        inner.chain.primary_pass(title).await
    };
    let outcome = match pass {
        PrimaryPass::Hit(result) => LookupOutcome::Found(result),
        PrimaryPass::Miss { inconclusive } => {
            inner.chain.secondary_pass(title, inconclusive).await?
        }
    };
    metrics::histogram!(telemetry::LOOKUP_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
    metrics::counter!(telemetry::LOOKUPS_TOTAL, "outcome" => outcome.label()).increment(1);

    match outcome {
        LookupOutcome::Found(result) => {
            inner.cache.put_found(title, result.clone()).await;
            Ok(Some(result))
        }
        LookupOutcome::NotFound => {
            inner.cache.put_missing(title).await;
            Ok(None)
        }
        LookupOutcome::Unavailable => {
            warn!(title, "no rating and providers were unreachable, not caching");
            Ok(None)
        }
    }
}
