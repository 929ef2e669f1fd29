//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use marquee::{Marquee, MemoryStore, telemetry};
use std::sync::Arc;

mod common;
use common::{ScriptedPrimary, ScriptedSecondary, arc, rating};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for `name` carrying the label `label=value`.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn lookup_and_cache_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let engine = Marquee::builder()
                    .primary_provider(arc(
                        ScriptedPrimary::new().hit("Jaws", rating("97%", "8.1/10", "Jaws")),
                    ))
                    .secondary_provider(arc(ScriptedSecondary::not_found()))
                    .store(Arc::new(MemoryStore::new()))
                    .dispatch_config(common::fast_dispatch())
                    .build()
                    .await
                    .unwrap();
                engine.resolve("Jaws").await.unwrap();
                engine.resolve("Jaws").await.unwrap();
                engine.resolve("Nope").await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::LOOKUPS_TOTAL, "outcome", "found"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::LOOKUPS_TOTAL, "outcome", "not_found"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, "kind", "found"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 2);
    assert!(
        has_histogram(&snapshot, telemetry::LOOKUP_DURATION_SECONDS),
        "expected a lookup duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn blocked_titles_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let engine = Marquee::builder()
                    .primary_provider(arc(ScriptedPrimary::new()))
                    .secondary_provider(arc(ScriptedSecondary::not_found()))
                    .blocklist(["dating"])
                    .build()
                    .await
                    .unwrap();
                engine.rate("Dating Around").await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::BLOCKED_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::LOOKUPS_TOTAL), 0);
}
