//! Rate-limited, strictly FIFO dispatcher for the secondary provider.
//!
//! Scraped sites throttle clients that hit them at a fixed cadence, so
//! every secondary-provider request goes through one queue drained by a
//! single background task that waits `base_delay + uniform(0, max_jitter)`
//! between consecutive jobs.
//!
//! # States
//!
//! ```text
//!   submit (queue was idle)             queue empty after a job
//!  ┌──────┐ ─────────────────────► ┌──────────┐ ─────────────────► ┌──────┐
//!  │ Idle │                        │ Draining │                    │ Idle │
//!  └──────┘ ◄── submit only ──────  └──────────┘                    └──────┘
//!              enqueues while draining
//! ```
//!
//! The "draining" flag and the queue live under one mutex, so there is at
//! most one drain task at any time. The lock is never held across an
//! `.await`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::providers::{SecondaryProvider, SecondaryResponse};
use crate::telemetry;
use crate::{MarqueeError, Result};

/// Pacing configuration for the dispatcher.
///
/// ```rust
/// # use marquee::DispatchConfig;
/// # use std::time::Duration;
/// let config = DispatchConfig::new()
///     .base_delay(Duration::from_secs(3))
///     .max_jitter(Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Minimum gap between consecutive jobs. Default: 2000ms.
    pub base_delay: Duration,
    /// Upper bound of the random extra gap. Default: 1500ms.
    pub max_jitter: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::from_millis(1500),
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Gap to wait before the next job: `base_delay + uniform(0, max_jitter)`.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base_delay;
        }
        self.base_delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

struct Job {
    title: String,
    reply: oneshot::Sender<SecondaryResponse>,
}

#[derive(Default)]
struct DispatchState {
    queue: VecDeque<Job>,
    draining: bool,
}

struct DispatcherInner {
    provider: Arc<dyn SecondaryProvider>,
    config: DispatchConfig,
    state: Mutex<DispatchState>,
}

impl DispatcherInner {
    fn lock_state(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serializes secondary-provider lookups with jittered spacing.
///
/// Cheap to clone; clones share one queue.
#[derive(Clone)]
pub struct RateLimitedDispatcher {
    inner: Arc<DispatcherInner>,
}

impl RateLimitedDispatcher {
    pub fn new(provider: Arc<dyn SecondaryProvider>, config: DispatchConfig) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                provider,
                config,
                state: Mutex::new(DispatchState::default()),
            }),
        }
    }

    /// Queue a lookup for `title` and wait for its turn and result.
    ///
    /// Jobs run in submission order. Dropping the returned future does not
    /// remove the job; it still runs and its result is discarded.
    ///
    /// # Errors
    ///
    /// [`MarqueeError::ShutDown`] if the drain task died before reaching the
    /// job.
    pub async fn submit(&self, title: &str) -> Result<SecondaryResponse> {
        let (reply, rx) = oneshot::channel();
        let start_drain = {
            let mut state = self.inner.lock_state();
            state.queue.push_back(Job {
                title: title.to_string(),
                reply,
            });
            debug!(title, queued = state.queue.len(), "dispatcher: job queued");
            !std::mem::replace(&mut state.draining, true)
        };
        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }
        rx.await.map_err(|_| MarqueeError::ShutDown("dispatcher"))
    }

    /// Jobs waiting to run (not counting the one in progress).
    pub fn queued(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    /// Whether a drain task is currently active.
    pub fn is_draining(&self) -> bool {
        self.inner.lock_state().draining
    }
}

/// The single drain loop. Exits, flipping back to idle, when a job settles
/// and nothing else is queued.
async fn drain(inner: Arc<DispatcherInner>) {
    let _guard = DrainGuard(Arc::clone(&inner));
    let mut next = inner.lock_state().queue.pop_front();
    while let Some(job) = next {
        let response = inner.provider.search(&job.title).await;
        metrics::counter!(telemetry::DISPATCH_JOBS_TOTAL).increment(1);
        // The submitter may have gone away; the result is then dropped.
        let _ = job.reply.send(response);

        {
            let mut state = inner.lock_state();
            if state.queue.is_empty() {
                state.draining = false;
                return;
            }
        }

        let delay = inner.config.next_delay();
        metrics::histogram!(telemetry::DISPATCH_DELAY_SECONDS).record(delay.as_secs_f64());
        debug!(delay_ms = delay.as_millis() as u64, "dispatcher: pacing");
        tokio::time::sleep(delay).await;

        next = inner.lock_state().queue.pop_front();
    }
    inner.lock_state().draining = false;
}

/// Resets the dispatcher if a provider panics mid-drain: queued jobs are
/// dropped (their submitters see `ShutDown`) and the next submit starts a
/// fresh drain task.
struct DrainGuard(Arc<DispatcherInner>);

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.0.lock_state();
            error!(
                dropped = state.queue.len(),
                "dispatcher drain task panicked, dropping queued jobs"
            );
            state.queue.clear();
            state.draining = false;
        }
    }
}
