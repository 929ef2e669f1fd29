//! Telemetry metric name constants.
//!
//! Centralised metric names for marquee operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `marquee_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider name (e.g. "omdb", "rotten_tomatoes")
//! - `status`: outcome: "ok", "not_found" or "error"
//! - `outcome`: lookup chain result: "found", "not_found" or "unavailable"
//! - `kind`: cache entry kind: "found" or "missing"

/// Total provider requests.
///
/// Labels: `provider`, `status` ("ok" | "not_found" | "error").
pub const PROVIDER_REQUESTS_TOTAL: &str = "marquee_provider_requests_total";

/// Provider request duration in seconds.
///
/// Labels: `provider`.
pub const PROVIDER_REQUEST_DURATION_SECONDS: &str = "marquee_provider_request_duration_seconds";

/// Total retry attempts against the primary provider (not counting the
/// initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "marquee_retries_total";

/// Total lookup chain executions.
///
/// Labels: `outcome` ("found" | "not_found" | "unavailable").
pub const LOOKUPS_TOTAL: &str = "marquee_lookups_total";

/// Lookup chain duration in seconds, including dispatcher queueing.
pub const LOOKUP_DURATION_SECONDS: &str = "marquee_lookup_duration_seconds";

/// Resolve calls that joined an already in-flight lookup.
pub const DEDUP_JOINS_TOTAL: &str = "marquee_dedup_joins_total";

/// Total rating cache hits.
///
/// Labels: `kind` ("found" | "missing").
pub const CACHE_HITS_TOTAL: &str = "marquee_cache_hits_total";

/// Total rating cache misses, including expired entries.
pub const CACHE_MISSES_TOTAL: &str = "marquee_cache_misses_total";

/// Total cache flushes that failed to reach the durable store.
pub const CACHE_FLUSH_FAILURES_TOTAL: &str = "marquee_cache_flush_failures_total";

/// Total jobs executed by the rate-limited dispatcher.
pub const DISPATCH_JOBS_TOTAL: &str = "marquee_dispatch_jobs_total";

/// Inter-job delay applied by the dispatcher, in seconds.
pub const DISPATCH_DELAY_SECONDS: &str = "marquee_dispatch_delay_seconds";

/// Titles short-circuited by the block-list.
pub const BLOCKED_TOTAL: &str = "marquee_blocked_total";
