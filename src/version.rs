//! Build identity: package version plus the git state vergen captured.
//!
//! Printed by `marquee version` and sent to the rating providers as the
//! HTTP `User-Agent`.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git branch at build time, or "unknown" outside a checkout.
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Git commit SHA at build time, or "unknown" outside a checkout.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

const SHORT_SHA_LEN: usize = 7;

/// Whether the working tree had uncommitted changes at build time.
pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

fn short_sha() -> &'static str {
    GIT_SHA.get(..SHORT_SHA_LEN).unwrap_or(GIT_SHA)
}

/// Version with build metadata, e.g. `0.1.0+main.3f9c2ab` or, for a
/// tarball build, `0.1.0+unknown.unknown`. A dirty tree appends `.dirty`.
pub fn version_string() -> String {
    let dirty = if git_dirty() { ".dirty" } else { "" };
    format!("{PKG_VERSION}+{GIT_BRANCH}.{}{dirty}", short_sha())
}

/// `User-Agent` header value for outgoing provider requests.
pub fn user_agent() -> String {
    format!("marquee/{PKG_VERSION}")
}
