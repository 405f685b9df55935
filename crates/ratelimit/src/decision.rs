//! The outcome of a rate-limit check.

/// Result of checking a single client key against the configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the window resets, per spec.md §4.2 step 3
    /// (`X-RateLimit-Reset: W_seconds`).
    pub reset_seconds: u64,
}
