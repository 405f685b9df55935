//! RouteResolve — looks up the route table before RateLimit or Authenticate
//! run, so an unmatched path 404s without consuming a rate-limit token or
//! running the auth check (spec.md §4.4: "An unmatched route returns 404
//! before rate-limiting or authentication").

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use edgerouter_core::ApiError;

use crate::state::AppState;

pub async fn route_resolve(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match state.routes.resolve(req.method(), req.uri().path()).cloned() {
        Some(entry) => {
            req.extensions_mut().insert(entry);
            next.run(req).await
        }
        None => ApiError::not_found("no route matches").into_response(),
    }
}
