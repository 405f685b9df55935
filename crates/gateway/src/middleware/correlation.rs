//! CorrelationID — resolves the request's id and guarantees it is present
//! on the outbound response even when a later stage short-circuits
//! (spec.md §4.1, §9 "Correlation id injection timing").

use std::sync::{Arc, Mutex};

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use edgerouter_core::context::RequestContext;
use edgerouter_core::headers::X_REQUEST_ID;

pub async fn correlation_id(req: Request, next: Next) -> Response {
    let inbound = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let id = inbound.unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Some(ctx) = req.extensions().get::<Arc<Mutex<RequestContext>>>() {
        ctx.lock().expect("context mutex poisoned").correlation_id = id.clone();
    }

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
