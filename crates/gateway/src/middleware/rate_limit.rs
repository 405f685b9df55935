//! RateLimit — runs before Authenticate so high-volume callers cannot
//! exercise the signature check (spec.md §4.1 ordering rationale, §4.2).

use std::sync::{Arc, Mutex};

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use edgerouter_core::ApiError;
use edgerouter_core::context::RequestContext;
use edgerouter_core::headers::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};
use edgerouter_ratelimit::RateLimitDecision;

use crate::state::AppState;

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = req
        .extensions()
        .get::<Arc<Mutex<RequestContext>>>()
        .map(|ctx| ctx.lock().expect("context mutex poisoned").client_ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let decision = state.limiter.check(&key).await;

    if !decision.allowed {
        let mut response = ApiError::rate_limit_exceeded("rate limit exceeded").into_response();
        apply_headers(&mut response, decision);
        return response;
    }

    let mut response = next.run(req).await;
    apply_headers(&mut response, decision);
    response
}

fn apply_headers(response: &mut Response, decision: RateLimitDecision) {
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert(X_RATELIMIT_LIMIT, v);
    }
    if let Ok(v) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert(X_RATELIMIT_REMAINING, v);
    }
    if let Ok(v) = HeaderValue::from_str(&decision.reset_seconds.to_string()) {
        headers.insert(X_RATELIMIT_RESET, v);
    }
}
