//! Recover — the outermost stage. A panic anywhere downstream becomes a
//! 500 response instead of tearing down the worker task (spec.md §4.1,
//! §7 "Non-crashing discipline").

use std::any::Any;

use axum::response::{IntoResponse, Response};
use tracing::error;

use edgerouter_core::ApiError;

pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(&payload);
    error!(panic = %message, "panic recovered in request pipeline");
    ApiError::internal("internal error").into_response()
}

fn panic_message(payload: &(dyn Any + Send + 'static)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
