//! Provider traits and their tagged responses.
//!
//! Two tiers of rating source sit behind these traits:
//!
//! - [`PrimaryProvider`]: a structured API queried directly, once per title
//!   variation. Transport failures are returned as `Err` so decorators such
//!   as [`RetryingPrimaryProvider`](super::retry::RetryingPrimaryProvider)
//!   can act on them.
//! - [`SecondaryProvider`]: scraped pages, only ever called through the
//!   [`RateLimitedDispatcher`](crate::dispatch::RateLimitedDispatcher). It
//!   never fails: every problem is folded into [`SecondaryResponse::Error`].
//!
//! # Example
//!
//! ```ignore
//! async fn lookup(&self, title: &str) -> Result<PrimaryResponse> {
//!     match self.fetch(title).await? {
//!         Some(result) => Ok(PrimaryResponse::Found(result)),
//!         None => Ok(PrimaryResponse::NotFound),
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::types::RatingResult;
use crate::{MarqueeError, Result};

/// Outcome of one primary-provider request.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryResponse {
    /// The provider knows the title and reported at least one score.
    Found(RatingResult),
    /// Unknown title, or known but without any usable score.
    NotFound,
}

/// Outcome of one secondary-provider attempt.
#[derive(Debug, Clone)]
pub enum SecondaryResponse {
    Found(RatingResult),
    /// No search hit, or the detail page carried no recognizable score.
    NotFound,
    /// Transport failure; the attempt is inconclusive.
    Error(MarqueeError),
}

/// Structured rating source queried by exact title.
#[async_trait]
pub trait PrimaryProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Look up one exact title spelling.
    async fn lookup(&self, title: &str) -> Result<PrimaryResponse>;
}

/// Unstructured, rate-sensitive rating source.
#[async_trait]
pub trait SecondaryProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Search for `title` and read scores from the best match.
    async fn search(&self, title: &str) -> SecondaryResponse;
}
