//! Two-tier lookup chain.
//!
//! ```text
//!   title ──► variations(title)
//!               │ for each, in order
//!               ▼
//!       ┌─────────────────┐  Found ──► done
//!       │ PrimaryProvider │
//!       └────────┬────────┘
//!                │ no hit for any variation
//!                ▼
//!       ┌───────────────────────┐
//!       │ RateLimitedDispatcher │  one attempt, original title
//!       │   └ SecondaryProvider │  Found ──► done
//!       └────────┬──────────────┘
//!                ▼
//!        NotFound / Unavailable
//! ```
//!
//! The chain is stateless; the coordinator decides what to cache.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::dispatch::RateLimitedDispatcher;
use crate::providers::{PrimaryProvider, PrimaryResponse, SecondaryResponse};
use crate::title::variations;
use crate::types::RatingResult;

/// Result of one full chain execution.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(RatingResult),
    /// Every step answered cleanly and none had a rating. Safe to cache.
    NotFound,
    /// No rating, but at least one step failed in transit, so the miss is
    /// not conclusive and must not be cached.
    Unavailable,
}

impl LookupOutcome {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            LookupOutcome::Found(_) => "found",
            LookupOutcome::NotFound => "not_found",
            LookupOutcome::Unavailable => "unavailable",
        }
    }
}

/// Primary provider over all title variations, then one queued secondary
/// attempt.
#[derive(Clone)]
pub struct LookupChain {
    primary: Arc<dyn PrimaryProvider>,
    dispatcher: RateLimitedDispatcher,
}

impl LookupChain {
    pub fn new(primary: Arc<dyn PrimaryProvider>, dispatcher: RateLimitedDispatcher) -> Self {
        Self {
            primary,
            dispatcher,
        }
    }

    /// Run the chain for `title`.
    ///
    /// Provider failures are absorbed into the outcome. The only error is
    /// [`MarqueeError::ShutDown`](crate::MarqueeError::ShutDown) from a dead
    /// dispatcher.
    pub async fn lookup(&self, title: &str) -> Result<LookupOutcome> {
        match self.primary_pass(title).await {
            PrimaryPass::Hit(result) => Ok(LookupOutcome::Found(result)),
            PrimaryPass::Miss { inconclusive } => self.secondary_pass(title, inconclusive).await,
        }
    }

    /// Ask the primary provider for every variation of `title`, stopping at
    /// the first hit.
    #[instrument(skip(self), fields(primary = self.primary.name()))]
    pub(crate) async fn primary_pass(&self, title: &str) -> PrimaryPass {
        let mut inconclusive = false;

        for variation in variations(title) {
            match self.primary.lookup(&variation).await {
                Ok(PrimaryResponse::Found(result)) => {
                    info!(title, variation = %variation, "rating found via primary provider");
                    return PrimaryPass::Hit(result);
                }
                Ok(PrimaryResponse::NotFound) => {
                    debug!(variation = %variation, "primary provider: no rating");
                }
                Err(e) => {
                    warn!(variation = %variation, error = %e, "primary provider request failed");
                    inconclusive = true;
                }
            }
        }
        PrimaryPass::Miss { inconclusive }
    }

    /// One queued secondary attempt for the original `title`, after the
    /// primary pass missed.
    #[instrument(skip(self))]
    pub(crate) async fn secondary_pass(
        &self,
        title: &str,
        inconclusive: bool,
    ) -> Result<LookupOutcome> {
        match self.dispatcher.submit(title).await? {
            SecondaryResponse::Found(result) => {
                info!(title, "rating found via secondary provider");
                Ok(LookupOutcome::Found(result))
            }
            SecondaryResponse::NotFound if !inconclusive => Ok(LookupOutcome::NotFound),
            SecondaryResponse::NotFound => Ok(LookupOutcome::Unavailable),
            SecondaryResponse::Error(e) => {
                warn!(title, error = %e, "secondary provider failed, miss is inconclusive");
                Ok(LookupOutcome::Unavailable)
            }
        }
    }
}

/// What the primary pass settled.
pub(crate) enum PrimaryPass {
    Hit(RatingResult),
    /// No variation had a rating. `inconclusive` is set when any request
    /// failed in transit.
    Miss { inconclusive: bool },
}
