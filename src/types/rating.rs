//! Rating result and caller-facing verdict types.

use serde::{Deserialize, Serialize};

/// A resolved critic/audience rating pair for one title.
///
/// At least one of `critics` or `audience` is always present: the only
/// constructor is [`RatingResult::new`], which returns `None` when both
/// are missing, and deserialization rejects such values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRatingResult")]
pub struct RatingResult {
    critics: Option<String>,
    audience: Option<String>,
    source_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,
}

impl RatingResult {
    /// Build a result, or `None` if neither score is present.
    pub fn new(
        critics: Option<String>,
        audience: Option<String>,
        source_title: impl Into<String>,
    ) -> Option<Self> {
        if critics.is_none() && audience.is_none() {
            return None;
        }
        Some(Self {
            critics,
            audience,
            source_title: source_title.into(),
            source_year: None,
            source_url: None,
        })
    }

    /// Attach the release year reported by the provider.
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.source_year = Some(year.into());
        self
    }

    /// Attach the page the scores were read from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Critics score, e.g. `"90%"`.
    pub fn critics(&self) -> Option<&str> {
        self.critics.as_deref()
    }

    /// Audience score, e.g. `"85%"` or `"8.1/10"`.
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// Title as reported by the provider.
    pub fn source_title(&self) -> &str {
        &self.source_title
    }

    pub fn source_year(&self) -> Option<&str> {
        self.source_year.as_deref()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRatingResult {
    #[serde(default)]
    critics: Option<String>,
    #[serde(default)]
    audience: Option<String>,
    source_title: String,
    #[serde(default)]
    source_year: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
}

impl TryFrom<RawRatingResult> for RatingResult {
    type Error = String;

    fn try_from(raw: RawRatingResult) -> Result<Self, Self::Error> {
        let mut result = RatingResult::new(raw.critics, raw.audience, raw.source_title)
            .ok_or_else(|| "rating result has neither critics nor audience score".to_string())?;
        result.source_year = raw.source_year;
        result.source_url = raw.source_url;
        Ok(result)
    }
}

/// What the engine has to say about a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The title matched the block-list; no lookup was made.
    Blocked,
    /// A rating was found (live or cached).
    Rated(RatingResult),
    /// No rating exists, or the providers could not be reached.
    Unrated,
}

impl Verdict {
    pub fn rating(&self) -> Option<&RatingResult> {
        match self {
            Verdict::Rated(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Option<RatingResult>> for Verdict {
    fn from(value: Option<RatingResult>) -> Self {
        value.map_or(Verdict::Unrated, Verdict::Rated)
    }
}
