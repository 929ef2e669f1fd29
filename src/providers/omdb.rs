//! OMDb client, the primary (structured) rating source.
//!
//! `GET /?t=<title>&apikey=<key>` returns a JSON document whose `Response`
//! field says whether the title was found. Critics come from the
//! `Ratings` entry sourced from Rotten Tomatoes, audience from
//! `imdbRating`. See: <https://www.omdbapi.com/>

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{http_client, record_request};
use super::traits::{PrimaryProvider, PrimaryResponse};
use crate::types::RatingResult;
use crate::{MarqueeError, Result};

/// Default base URL for the OMDb API
pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com";

/// Public demo key used when none is configured.
pub const DEFAULT_API_KEY: &str = "trilogy";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "omdb";
const CRITICS_SOURCE: &str = "Rotten Tomatoes";
const UNAVAILABLE: &str = "N/A";

/// Client for the OMDb API.
#[derive(Clone)]
pub struct OmdbClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OmdbClient {
    /// Create a client against the public OMDb endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_timeout(api_key, base_url, DEFAULT_TIMEOUT).expect("failed to build HTTP client")
    }

    /// Create a client whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// [`MarqueeError::Configuration`] if the HTTP client cannot be built.
    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, title: &str) -> Result<PrimaryResponse> {
        let url = format!("{}/", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("t", title), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| MarqueeError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(MarqueeError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MarqueeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: OmdbResponse = response
            .json()
            .await
            .map_err(|e| MarqueeError::Json(e.to_string()))?;
        Ok(interpret(body, title))
    }
}

#[async_trait]
impl PrimaryProvider for OmdbClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn lookup(&self, title: &str) -> Result<PrimaryResponse> {
        let start = Instant::now();
        let result = self.fetch(title).await;
        let status = match &result {
            Ok(PrimaryResponse::Found(_)) => "ok",
            Ok(PrimaryResponse::NotFound) => "not_found",
            Err(_) => "error",
        };
        record_request(PROVIDER_NAME, start, status);
        result
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    ratings: Vec<OmdbRating>,
    #[serde(default, rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbRating {
    source: String,
    value: String,
}

/// Map an OMDb document to a tagged response. `requested` is used as the
/// source title when the document omits one.
fn interpret(body: OmdbResponse, requested: &str) -> PrimaryResponse {
    if body.response != "True" {
        debug!(title = requested, reason = ?body.error, "omdb: not found");
        return PrimaryResponse::NotFound;
    }

    let critics = body
        .ratings
        .into_iter()
        .find(|r| r.source == CRITICS_SOURCE)
        .map(|r| r.value);
    let audience = body
        .imdb_rating
        .filter(|r| !r.is_empty() && r != UNAVAILABLE)
        .map(|r| format!("{r}/10"));
    let source_title = body.title.unwrap_or_else(|| requested.to_string());

    match RatingResult::new(critics, audience, source_title) {
        Some(result) => match body.year {
            Some(year) => PrimaryResponse::Found(result.with_year(year)),
            None => PrimaryResponse::Found(result),
        },
        None => PrimaryResponse::NotFound,
    }
}
