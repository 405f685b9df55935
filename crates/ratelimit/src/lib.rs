//! Per-client request rate limiting, with a shared (Redis-backed) store
//! for multi-instance deployments and a local in-memory fallback — grounded
//! in `DokaIzk-StellarRoute`'s rate-limit middleware (`Backend` enum with
//! Redis + in-memory paths) and generalized beyond the teacher's fixed
//! 60-requests/60-seconds in-memory `RateLimiter`
//! (`rustedclaw-gateway::RateLimiter`) to a configurable `(R, W)` policy.

mod decision;
mod local;
mod resp;
mod shared;

pub use decision::RateLimitDecision;
pub use local::LocalRateLimiter;
pub use shared::SharedRateLimiter;

use async_trait::async_trait;

/// A per-client rate-limit backend. Implemented by both
/// [`LocalRateLimiter`] and [`SharedRateLimiter`] so the gateway can
/// select one at startup without the rest of the pipeline caring which.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check and record one request for `key` (typically the client IP),
    /// returning the decision and the counters needed for
    /// `X-RateLimit-*` response headers.
    async fn check(&self, key: &str) -> RateLimitDecision;
}
