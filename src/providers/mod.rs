//! Rating providers.
//!
//! - [`omdb`]: primary, structured JSON API.
//! - [`rotten_tomatoes`]: secondary, scraped HTML with a pluggable
//!   [`markup`] parser.
//! - [`retry`]: retry decorator for the primary provider.

use std::time::{Duration, Instant};

use crate::telemetry;
use crate::{MarqueeError, Result};

pub mod markup;
pub mod omdb;
pub mod retry;
pub mod rotten_tomatoes;
pub mod traits;

pub use markup::{ScoreParser, ScoreboardParser};
pub use omdb::OmdbClient;
pub use retry::{RetryConfig, RetryingPrimaryProvider};
pub use rotten_tomatoes::RottenTomatoesClient;
pub use traits::{PrimaryProvider, PrimaryResponse, SecondaryProvider, SecondaryResponse};

/// Record request outcome metrics (counter + histogram).
/// HTTP client with a request timeout and the crate's `User-Agent`, shared
/// by both providers.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(crate::version::user_agent())
        .build()
        .map_err(|e| MarqueeError::Configuration(format!("failed to build HTTP client: {e}")))
}

pub(crate) fn record_request(provider: &'static str, start: Instant, status: &'static str) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(telemetry::PROVIDER_REQUESTS_TOTAL,
        "provider" => provider,
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::PROVIDER_REQUEST_DURATION_SECONDS,
        "provider" => provider,
    )
    .record(elapsed);
}
