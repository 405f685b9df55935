//! In-memory rate limiter for single-instance deployments or as the
//! fail-open fallback behind [`crate::SharedRateLimiter`].
//!
//! Generalizes the teacher's `rustedclaw-gateway::RateLimiter` (a fixed
//! 60-requests-per-60-seconds sliding window keyed by client IP, guarded
//! by a single `std::sync::Mutex<HashMap<..>>`) to a configurable
//! `(requests, window)` policy, and adds the background sweeper spec.md
//! §4.2 requires to bound map growth.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::{RateLimitDecision, RateLimiter};

struct ClientWindow {
    count: u32,
    first_seen: Instant,
}

/// Fixed-window counter per client key, held in a single mutex — the
/// critical section is O(1) so lock contention stays cheap even under
/// load (spec.md §5).
pub struct LocalRateLimiter {
    requests: u32,
    window: Duration,
    state: Mutex<HashMap<String, ClientWindow>>,
}

impl LocalRateLimiter {
    /// Build the limiter and spawn its background sweeper, which evicts
    /// entries idle for more than `2 * window` so the map doesn't grow
    /// unboundedly under a churn of distinct client keys.
    pub fn spawn(requests: u32, window: Duration) -> Arc<Self> {
        let limiter = Arc::new(Self {
            requests,
            window,
            state: Mutex::new(HashMap::new()),
        });
        Self::spawn_sweeper(Arc::clone(&limiter));
        limiter
    }

    /// Build the limiter without a sweeper task, for tests that want to
    /// control eviction deterministically via [`Self::sweep`].
    #[cfg(test)]
    fn new(requests: u32, window: Duration) -> Self {
        Self {
            requests,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }

    fn spawn_sweeper(limiter: Arc<Self>) {
        let period = limiter.window;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                limiter.sweep();
            }
        });
    }

    fn sweep(&self) {
        let ttl = self.window * 2;
        let now = Instant::now();
        let mut state = self.state.lock().expect("rate limit mutex poisoned");
        let before = state.len();
        state.retain(|_, w| now.duration_since(w.first_seen) < ttl);
        let evicted = before - state.len();
        if evicted > 0 {
            debug!(evicted, remaining = state.len(), "rate limit sweep");
        }
    }
}

#[async_trait]
impl RateLimiter for LocalRateLimiter {
    async fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut state = self.state.lock().expect("rate limit mutex poisoned");
        let entry = state.entry(key.to_string()).or_insert_with(|| ClientWindow {
            count: 0,
            first_seen: now,
        });

        if now.duration_since(entry.first_seen) >= self.window {
            entry.count = 0;
            entry.first_seen = now;
        }
        entry.count += 1;

        let allowed = entry.count <= self.requests;
        let remaining = self.requests.saturating_sub(entry.count);
        let elapsed = now.duration_since(entry.first_seen);
        let reset_seconds = self.window.saturating_sub(elapsed).as_secs();

        RateLimitDecision {
            allowed,
            limit: self.requests,
            remaining,
            reset_seconds,
        }
    }
}
