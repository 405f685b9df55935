//! AccessLog — the outermost stage but one (inside only Recover), so it
//! captures the final status and latency of every request including ones
//! short-circuited deep in the pipeline (spec.md §4.1).

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info};

use edgerouter_core::context::RequestContext;

pub async fn access_log(mut req: Request, next: Next) -> Response {
    let peer_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or_else(|| std::net::Ipv4Addr::UNSPECIFIED.into());

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // One context per request, shared with every downstream stage via
    // extensions — CorrelationID fills in the real id, Authenticate fills
    // in the principal, the handler fills in the upstream target.
    let ctx = Arc::new(Mutex::new(RequestContext::new(String::new(), peer_ip)));
    req.extensions_mut().insert(ctx.clone());

    let response = next.run(req).await;

    let (elapsed_ms, correlation_id, principal) = {
        let guard = ctx.lock().expect("context mutex poisoned");
        (guard.elapsed_ms(), guard.correlation_id.clone(), guard.principal.kind())
    };
    let status = response.status().as_u16();

    if status >= 500 {
        error!(%method, %path, status, elapsed_ms, %correlation_id, principal, "request failed");
    } else {
        info!(%method, %path, status, elapsed_ms, %correlation_id, principal, "request completed");
    }

    response
}
