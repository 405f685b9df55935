//! The `/health` endpoint — served locally, never forwarded, and
//! independent of upstream reachability (spec.md §4.4 "Health probe").

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    time: String,
}

pub fn response() -> Response {
    let body = HealthResponse {
        status: "healthy",
        service: "gateway",
        version: env!("CARGO_PKG_VERSION"),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    Json(body).into_response()
}
