//! The Authenticator and Authorizer stages (spec.md §4.3).
//!
//! Runs inside [`crate::router::gateway_handler`] once the route is
//! resolved, since the authentication policy to apply is a property of
//! the matched route.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use edgerouter_config::AppConfig;
use edgerouter_core::headers::X_API_KEY;
use edgerouter_core::{ApiError, AuthPolicy, Principal};
use edgerouter_security::BearerError;

/// Resolve the principal for a request against the route's auth policy.
/// Never issues an upstream call — API-key validity is delegated
/// entirely to the matched upstream (spec.md §4.3 "API-key verification").
pub fn resolve_principal(
    config: &AppConfig,
    headers: &HeaderMap,
    policy: AuthPolicy,
) -> Result<Principal, ApiError> {
    match policy {
        AuthPolicy::None => Ok(Principal::Anonymous),
        AuthPolicy::BearerRequired => verify_bearer(config, headers),
        AuthPolicy::BearerOrApiKey => match headers.get(X_API_KEY).and_then(|v| v.to_str().ok()) {
            Some(raw_key) if !raw_key.is_empty() => Ok(api_key_principal(raw_key)),
            _ => verify_bearer(config, headers),
        },
    }
}

fn verify_bearer(config: &AppConfig, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let header_value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| map_bearer_error(BearerError::MissingHeader))?;

    let token = edgerouter_security::parse_authorization_header(header_value)
        .map_err(map_bearer_error)?;

    let claims = edgerouter_security::verify(config.jwt_secret.as_bytes(), token, now_unix())
        .map_err(map_bearer_error)?;

    Ok(Principal::Bearer {
        user_id: claims.user_id,
        email: claims.email,
        role: claims.role,
    })
}

fn api_key_principal(raw_key: &str) -> Principal {
    Principal::ApiKey {
        fingerprint: edgerouter_security::fingerprint(raw_key),
        display_prefix: edgerouter_security::display_prefix(raw_key),
    }
}

fn map_bearer_error(err: BearerError) -> ApiError {
    match err {
        BearerError::MissingHeader => ApiError::unauthorized("Authorization header is required"),
        BearerError::MalformedHeader => ApiError::unauthorized("Invalid authorization header format"),
        BearerError::InvalidOrExpired => ApiError::unauthorized("Invalid or expired token"),
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
