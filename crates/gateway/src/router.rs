//! Wires the route table, the pipeline stages, and the forwarder into a
//! single axum [`Router`].
//!
//! Route resolution happens in the [`route_resolve`](crate::middleware::route_resolve)
//! layer, outside RateLimit, so an unmatched path 404s before it can
//! consume a rate-limit token (spec.md §4.4). Everything the table can
//! resolve — including `/health` — is then handled by one fallback, since
//! the matched entry's `auth` policy decides whether Authenticate runs at
//! all.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Extension, Request, State};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use edgerouter_core::ApiError;
use edgerouter_core::context::RequestContext;
use edgerouter_core::route::{RouteEntry, Target};

use crate::middleware::{access_log, correlation, cors, rate_limit, recover, route_resolve, security_headers};
use crate::state::AppState;
use crate::{authenticate, health};

pub fn build_router(state: AppState) -> Router {
    let cors_layer = cors::build(&state.config);

    Router::new()
        .fallback(gateway_handler)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::rate_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            route_resolve::route_resolve,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers::security_headers,
        ))
        .layer(cors_layer)
        .layer(middleware::from_fn(cors::preflight_status))
        .layer(middleware::from_fn(correlation::correlation_id))
        .layer(middleware::from_fn(access_log::access_log))
        .layer(CatchPanicLayer::custom(recover::handle_panic))
        .with_state(state)
}

async fn gateway_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<Mutex<RequestContext>>>,
    Extension(route): Extension<RouteEntry>,
    req: Request,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    if route.target == Target::Local {
        return health::response();
    }

    let principal = match authenticate::resolve_principal(&state.config, req.headers(), route.auth) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let headers = req.headers().clone();
    let body = match axum::body::to_bytes(req.into_body(), crate::forward::MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ApiError::payload_too_large("request body exceeds the configured limit")
                .into_response();
        }
    };

    let ctx_snapshot = {
        let mut guard = ctx.lock().expect("context mutex poisoned");
        guard.principal = principal;
        guard.upstream = Some(route.target);
        guard.clone()
    };

    let target_base = match route.target {
        Target::Identity => state.config.auth_service_url.as_str(),
        Target::Solver => state.config.captcha_service_url.as_str(),
        Target::Local => unreachable!("Local targets return before forwarding"),
    };

    let path_and_query = match &query {
        Some(q) => format!("{path}?{q}"),
        None => path,
    };

    match state
        .forwarder
        .forward(target_base, &ctx_snapshot, method, &path_and_query, headers, body)
        .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
