//! Pipeline stages, applied as nested tower layers around the single
//! fallback handler in the order spec.md §2 and §4.4 prescribe:
//!
//! ```text
//! Recover → AccessLog → CorrelationID → CORS → SecurityHeaders → RouteResolve → RateLimit → (handler)
//! ```
//!
//! RouteResolve sits outside RateLimit so an unmatched path 404s without
//! consuming a rate-limit token or reaching Authenticate (spec.md §4.4).
//!
//! Each subsequent `.layer()` call in [`crate::router::build_router`] wraps
//! the router built so far, so the stages are registered innermost-first
//! and the last one registered ends up outermost.

pub mod access_log;
pub mod correlation;
pub mod cors;
pub mod rate_limit;
pub mod recover;
pub mod route_resolve;
pub mod security_headers;
