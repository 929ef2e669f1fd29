//! RatingEngine - block-list, cache, and lookup chain behind one handle

use std::sync::Arc;

use tracing::debug;

use crate::blocklist::Blocklist;
use crate::cache::RatingCache;
use crate::coordinator::RequestCoordinator;
use crate::dispatch::RateLimitedDispatcher;
use crate::telemetry;
use crate::types::{RatingResult, Verdict};
use crate::Result;

/// A configured rating engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct RatingEngine {
    coordinator: RequestCoordinator,
    cache: Arc<RatingCache>,
    blocklist: Arc<Blocklist>,
    dispatcher: RateLimitedDispatcher,
}

impl RatingEngine {
    pub(crate) fn new(
        coordinator: RequestCoordinator,
        cache: Arc<RatingCache>,
        blocklist: Arc<Blocklist>,
        dispatcher: RateLimitedDispatcher,
    ) -> Self {
        Self {
            coordinator,
            cache,
            blocklist,
            dispatcher,
        }
    }

    /// Resolve `title` to a rating, or `None` when no rating could be
    /// found.
    ///
    /// Served from the cache when possible; concurrent calls for the same
    /// title share one lookup. The block-list is not consulted.
    ///
    /// # Errors
    ///
    /// [`MarqueeError::InvalidInput`](crate::MarqueeError::InvalidInput) for
    /// an empty or whitespace-only title.
    pub async fn resolve(&self, title: &str) -> Result<Option<RatingResult>> {
        self.coordinator.resolve(title).await
    }

    /// Like [`resolve`](Self::resolve), but block-listed titles short-circuit
    /// to [`Verdict::Blocked`] without any lookup.
    pub async fn rate(&self, title: &str) -> Result<Verdict> {
        if self.is_blocked(title) {
            debug!(title, "title is block-listed");
            metrics::counter!(telemetry::BLOCKED_TOTAL).increment(1);
            return Ok(Verdict::Blocked);
        }
        Ok(self.resolve(title).await?.into())
    }

    pub fn is_blocked(&self, title: &str) -> bool {
        self.blocklist.contains(title)
    }

    /// Re-read the persisted block-list.
    pub async fn reload_blocklist(&self) {
        self.blocklist.reload().await;
    }

    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    pub fn cache(&self) -> &RatingCache {
        &self.cache
    }

    /// Persist the cache now instead of waiting for the next write-triggered
    /// flush.
    pub async fn flush(&self) -> Result<()> {
        self.cache.try_flush().await
    }

    /// Secondary-provider jobs waiting for their turn.
    pub fn queued_scrapes(&self) -> usize {
        self.dispatcher.queued()
    }

    /// Lookups currently running or waiting for a slot.
    pub fn in_flight(&self) -> usize {
        self.coordinator.in_flight()
    }
}
