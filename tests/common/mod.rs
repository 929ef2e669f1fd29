//! Mock providers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use marquee::providers::{PrimaryProvider, PrimaryResponse, SecondaryProvider, SecondaryResponse};
use marquee::{DispatchConfig, MarqueeError, RatingResult, Result, RetryConfig};

pub fn rating(critics: &str, audience: &str, title: &str) -> RatingResult {
    RatingResult::new(Some(critics.to_string()), Some(audience.to_string()), title)
        .expect("at least one score")
}

/// Dispatcher pacing short enough for real-clock tests.
pub fn fast_dispatch() -> DispatchConfig {
    DispatchConfig::new()
        .base_delay(Duration::from_millis(1))
        .max_jitter(Duration::ZERO)
}

pub fn no_retry() -> RetryConfig {
    RetryConfig::disabled()
}

// ============================================================================
// Primary
// ============================================================================

/// Primary provider answering from a fixed table, `NotFound` for anything
/// else. Records every title it was asked for.
#[derive(Default)]
pub struct ScriptedPrimary {
    hits: HashMap<String, RatingResult>,
    failing: bool,
    delay: Option<Duration>,
    calls: AtomicU32,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrimary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(mut self, title: &str, result: RatingResult) -> Self {
        self.hits.insert(title.to_string(), result);
        self
    }

    /// Every call fails with a transient HTTP error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrimaryProvider for ScriptedPrimary {
    fn name(&self) -> &str {
        "scripted-primary"
    }

    async fn lookup(&self, title: &str) -> Result<PrimaryResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.asked.lock().unwrap().push(title.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(MarqueeError::Http("connection reset".into()));
        }
        Ok(match self.hits.get(title) {
            Some(result) => PrimaryResponse::Found(result.clone()),
            None => PrimaryResponse::NotFound,
        })
    }
}

// ============================================================================
// Secondary
// ============================================================================

/// Secondary provider returning one canned response.
pub struct ScriptedSecondary {
    response: SecondaryResponse,
    delay: Option<Duration>,
    calls: AtomicU32,
    asked: Mutex<Vec<String>>,
}

impl ScriptedSecondary {
    pub fn not_found() -> Self {
        Self::responding(SecondaryResponse::NotFound)
    }

    pub fn found(result: RatingResult) -> Self {
        Self::responding(SecondaryResponse::Found(result))
    }

    pub fn error() -> Self {
        Self::responding(SecondaryResponse::Error(MarqueeError::Http(
            "timed out".into(),
        )))
    }

    fn responding(response: SecondaryResponse) -> Self {
        Self {
            response,
            delay: None,
            calls: AtomicU32::new(0),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Each search sleeps for `delay` before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecondaryProvider for ScriptedSecondary {
    fn name(&self) -> &str {
        "scripted-secondary"
    }

    async fn search(&self, title: &str) -> SecondaryResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.asked.lock().unwrap().push(title.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}

/// Secondary provider that records the (tokio) instant of each call.
#[derive(Default)]
pub struct TimedSecondary {
    pub calls: Mutex<Vec<(String, tokio::time::Instant)>>,
}

#[async_trait]
impl SecondaryProvider for TimedSecondary {
    fn name(&self) -> &str {
        "timed-secondary"
    }

    async fn search(&self, title: &str) -> SecondaryResponse {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), tokio::time::Instant::now()));
        SecondaryResponse::NotFound
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
