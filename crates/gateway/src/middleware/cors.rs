//! CORS policy construction (spec.md §6 "CORS").
//!
//! `tower_http::cors::CorsLayer` intercepts `OPTIONS` preflight requests at
//! the layer level, but answers with 200 OK by default. The spec's
//! "OPTIONS ... none (preflight) ... (local, 204)" route entry wants 204,
//! so [`preflight_status`] rewrites that one response after `CorsLayer` has
//! already attached the allow headers.

use std::time::Duration;

use axum::extract::Request;
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{AllowOrigin, CorsLayer};

use edgerouter_config::AppConfig;

const MAX_AGE: Duration = Duration::from_secs(86400);

/// Runs after `CorsLayer`, which already validated the origin and attached
/// the `Access-Control-Allow-*` headers — this only fixes the status code
/// on an `OPTIONS` preflight from CorsLayer's default 200 to the spec's 204.
pub async fn preflight_status(req: Request, next: Next) -> Response {
    let is_preflight = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;
    if is_preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

pub fn build(config: &AppConfig) -> CorsLayer {
    let origins = config.cors_origins.clone();
    let wildcard = origins.iter().any(|o| o == "*");

    // Credentials are always advertised per spec.md §6, which forbids a
    // literal `*` alongside `Access-Control-Allow-Credentials: true` — so
    // a configured wildcard is satisfied by reflecting whatever origin
    // the caller sent rather than emitting the `*` CorsLayer would.
    let allow_origin = if wildcard {
        AllowOrigin::predicate(|_origin, _parts| true)
    } else {
        AllowOrigin::predicate(move |origin, _parts| {
            origins.iter().any(|o| o.as_bytes() == origin.as_bytes())
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
        .max_age(MAX_AGE)
}
