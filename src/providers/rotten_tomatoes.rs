//! Rotten Tomatoes scraper, the secondary rating source.
//!
//! Two requests per attempt: the search page, from which the first movie
//! (`/m/...`) or show (`/tv/...`) link is taken, then that detail page,
//! from which scores are read by a [`ScoreParser`]. Nothing here is a
//! documented API; every failure is folded into a [`SecondaryResponse`]
//! instead of being raised.

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::markup::{ScoreParser, ScoreboardParser};
use super::{http_client, record_request};
use super::traits::{SecondaryProvider, SecondaryResponse};
use crate::types::RatingResult;
use crate::{MarqueeError, Result};

/// Default base URL for Rotten Tomatoes
pub const DEFAULT_BASE_URL: &str = "https://www.rottentomatoes.com";

const PROVIDER_NAME: &str = "rotten_tomatoes";

static DETAIL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(/(?:m|tv)/[^"?#\s]+)""#).expect("valid regex")
});

/// First movie or show detail link on a search page.
pub fn find_detail_link(html: &str) -> Option<&str> {
    DETAIL_LINK
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Scraping client for Rotten Tomatoes search and detail pages.
#[derive(Clone)]
pub struct RottenTomatoesClient {
    http: Client,
    base_url: String,
    parser: Arc<dyn ScoreParser>,
}

impl RottenTomatoesClient {
    /// Create a client against the public site.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, super::omdb::DEFAULT_TIMEOUT)
            .expect("failed to build HTTP client")
    }

    /// Create a client whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// [`MarqueeError::Configuration`] if the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            parser: Arc::new(ScoreboardParser),
        })
    }

    /// Swap in a parser for a newer page format.
    pub fn with_parser(mut self, parser: Arc<dyn ScoreParser>) -> Self {
        self.parser = parser;
        self
    }

    async fn get_text(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| MarqueeError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarqueeError::Api {
                status: status.as_u16(),
                message: format!("{PROVIDER_NAME} returned {status}"),
            });
        }
        response
            .text()
            .await
            .map_err(|e| MarqueeError::Http(e.to_string()))
    }

    async fn scrape(&self, title: &str) -> Result<SecondaryResponse> {
        let search_url = format!("{}/search", self.base_url);
        let search_page = self
            .get_text(self.http.get(&search_url).query(&[("search", title)]))
            .await?;

        let Some(link) = find_detail_link(&search_page) else {
            debug!(title, "rotten tomatoes: no detail link in search results");
            return Ok(SecondaryResponse::NotFound);
        };

        let detail_url = format!("{}{}", self.base_url, link);
        let detail_page = self.get_text(self.http.get(&detail_url)).await?;

        let critics = self.parser.critics(&detail_page).map(|s| format!("{s}%"));
        let audience = self.parser.audience(&detail_page).map(|s| format!("{s}%"));
        match RatingResult::new(critics, audience, title) {
            Some(result) => {
                info!(title, url = %detail_url, "rotten tomatoes: scores found");
                Ok(SecondaryResponse::Found(result.with_url(detail_url)))
            }
            None => {
                debug!(
                    title,
                    url = %detail_url,
                    parser = self.parser.version(),
                    "rotten tomatoes: no scores recognized on detail page"
                );
                Ok(SecondaryResponse::NotFound)
            }
        }
    }
}

impl Default for RottenTomatoesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecondaryProvider for RottenTomatoesClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(&self, title: &str) -> SecondaryResponse {
        let start = Instant::now();
        let response = match self.scrape(title).await {
            Ok(response) => response,
            Err(e) => {
                warn!(title, error = %e, "rotten tomatoes lookup failed");
                SecondaryResponse::Error(e)
            }
        };
        let status = match &response {
            SecondaryResponse::Found(_) => "ok",
            SecondaryResponse::NotFound => "not_found",
            SecondaryResponse::Error(_) => "error",
        };
        record_request(PROVIDER_NAME, start, status);
        response
    }
}
