//! Score extraction from Rotten Tomatoes detail-page markup.
//!
//! The page format is undocumented and changes without notice, so parsing
//! sits behind [`ScoreParser`] and each implementation carries a version
//! tag that shows up in logs. [`ScoreboardParser`] knows two generations of
//! markup and tries them in order for each score independently:
//!
//! 1. legacy attribute style: `<span data-qa="tomatometer">90%</span>`
//! 2. element attributes: `<score-board tomatometerscore="90" audiencescore="85">`

use std::sync::LazyLock;

use regex::Regex;

/// Extracts 0–100 scores from a detail page.
pub trait ScoreParser: Send + Sync {
    /// Version tag of the markup this parser understands.
    fn version(&self) -> &str;

    /// Critics (tomatometer) score.
    fn critics(&self, html: &str) -> Option<u8>;

    /// Audience score.
    fn audience(&self, html: &str) -> Option<u8>;
}

static LEGACY_CRITICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)data-qa="tomatometer"[^>]*>\s*(\d{1,3})\s*%"#).expect("valid regex")
});
static LEGACY_AUDIENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)data-qa="audience-score"[^>]*>\s*(\d{1,3})\s*%"#).expect("valid regex")
});
static ATTR_CRITICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\btomatometerscore\s*=\s*"(\d{1,3})""#).expect("valid regex")
});
static ATTR_AUDIENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\baudiencescore\s*=\s*"(\d{1,3})""#).expect("valid regex")
});

/// Default parser: legacy `data-qa` spans first, `<score-board>` attributes
/// second.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreboardParser;

impl ScoreParser for ScoreboardParser {
    fn version(&self) -> &str {
        "scoreboard-v2"
    }

    fn critics(&self, html: &str) -> Option<u8> {
        first_score(&[&*LEGACY_CRITICS, &*ATTR_CRITICS], html)
    }

    fn audience(&self, html: &str) -> Option<u8> {
        first_score(&[&*LEGACY_AUDIENCE, &*ATTR_AUDIENCE], html)
    }
}

fn first_score(patterns: &[&Regex], html: &str) -> Option<u8> {
    patterns.iter().find_map(|re| {
        re.captures(html)
            .and_then(|c| c[1].parse::<u8>().ok())
            .filter(|score| *score <= 100)
    })
}
