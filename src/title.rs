//! Title normalization: lookup keys, UI-prefix cleaning, and the candidate
//! spellings tried against the primary provider.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:\-\u{2013}\u{2014}]").expect("valid regex"));
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(?\d{4}\)?$").expect("valid regex"));
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(the|a|an)\s+").expect("valid regex"));
static UI_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(play|resume|my list|more info|rate|thumbs up|thumbs down)\b")
        .expect("valid regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalized, case-insensitive key for a title.
///
/// Used by both the rating cache and the in-flight table, so "The Office"
/// and "  the  office " share one cache entry and one lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TitleKey(String);

impl TitleKey {
    pub fn new(title: &str) -> Self {
        Self(collapse_whitespace(title).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip a leading player-control label ("Play", "Resume", "My List", ...)
/// that catalog UIs prepend to accessible titles.
///
/// ```
/// assert_eq!(marquee::title::clean_title("Play Stranger Things"), "Stranger Things");
/// ```
pub fn clean_title(raw: &str) -> String {
    collapse_whitespace(&UI_PREFIX.replace(raw.trim(), ""))
}

/// Candidate spellings for `title`, original first.
///
/// Each rule is applied to the original title and its output is kept only
/// if non-empty and not already present:
///
/// 1. colons, hyphens and dashes replaced with spaces
/// 2. trailing year, optionally parenthesized, removed
/// 3. every non-word character replaced with a space
/// 4. leading "The" / "A" / "An" removed
///
/// ```
/// let v = marquee::title::variations("The Matrix (1999)");
/// assert_eq!(v[0], "The Matrix (1999)");
/// assert!(v.contains(&"The Matrix".to_string()));
/// assert!(v.contains(&"Matrix (1999)".to_string()));
/// ```
pub fn variations(title: &str) -> Vec<String> {
    let candidates = [
        collapse_whitespace(&PUNCTUATION.replace_all(title, " ")),
        TRAILING_YEAR.replace(title, "").trim().to_string(),
        collapse_whitespace(&NON_WORD.replace_all(title, " ")),
        LEADING_ARTICLE.replace(title, "").trim().to_string(),
    ];

    let mut out = vec![title.to_string()];
    for candidate in candidates {
        if !candidate.is_empty() && !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}
