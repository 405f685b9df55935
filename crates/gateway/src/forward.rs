//! The reverse forwarder — builds the upstream request, relays the
//! response, and centralizes principal-to-header conversion (spec.md §4.4,
//! §9 "Principal representation").
//!
//! Grounded in the teacher's pooled-client conventions (connection reuse
//! via a process-lifetime `reqwest::Client`) generalized from a single
//! in-process agent call to a generic upstream proxy.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};

use edgerouter_core::context::RequestContext;
use edgerouter_core::headers::{
    X_API_KEY_HASH, X_FORWARDED_FOR, X_REAL_IP, X_REQUEST_ID, X_USER_EMAIL, X_USER_ID, X_USER_ROLE,
    is_hop_by_hop,
};
use edgerouter_core::{ApiError, Principal};

/// Maximum inbound body size the router will buffer before forwarding
/// (spec.md §4.4 step 3: "size-bounded; reject with 413 above a
/// configured ceiling").
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const MAX_IDLE_CONNS_PER_HOST: usize = 20;
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A pooled HTTP client shared across every forwarded request. Built once
/// at startup and never recreated — a fresh pool per request would defeat
/// keep-alive (spec.md §9 "Connection-pool lifetime").
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_CONNS_PER_HOST)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("reverse-proxy http client must build with static configuration");
        Self { client }
    }

    /// Forward one request to `target_base`, relaying the upstream
    /// response verbatim (status, headers minus hop-by-hop, body).
    pub async fn forward(
        &self,
        target_base: &str,
        ctx: &RequestContext,
        method: Method,
        path_and_query: &str,
        mut inbound_headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", target_base.trim_end_matches('/'), path_and_query);

        inbound_headers.retain(|name, _| !is_hop_by_hop(name.as_str()));
        apply_principal_headers(ctx, &mut inbound_headers);

        let response = self
            .client
            .request(method, &url)
            .headers(inbound_headers)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                ApiError::service_unavailable(format!("upstream request failed: {err}"))
            })?;

        relay(response).await
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

/// Centralizes principal → upstream-header conversion in one place, per
/// spec.md §9 ("implementations ... should centralize the conversion into
/// upstream headers in one function, not scatter it").
///
/// `X-Real-IP` always reflects the immediate peer (single-hop,
/// overwritten); `X-Forwarded-For` appends to any existing chain so that a
/// router chained behind itself preserves every hop (spec.md §8
/// idempotence test).
pub fn apply_principal_headers(ctx: &RequestContext, headers: &mut HeaderMap) {
    let ip = ctx.client_ip.to_string();

    if let Ok(value) = HeaderValue::from_str(&ctx.correlation_id) {
        headers.insert(HeaderName::from_static(X_REQUEST_ID), value);
    }

    let forwarded_for = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.is_empty() => format!("{existing}, {ip}"),
        _ => ip.clone(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert(HeaderName::from_static(X_FORWARDED_FOR), value);
    }
    if let Ok(value) = HeaderValue::from_str(&ip) {
        headers.insert(HeaderName::from_static(X_REAL_IP), value);
    }

    match &ctx.principal {
        Principal::Bearer { user_id, email, role } => {
            headers.insert(
                HeaderName::from_static(X_USER_ID),
                HeaderValue::from_str(&user_id.to_string()).expect("digits are valid header value"),
            );
            if let Ok(value) = HeaderValue::from_str(email) {
                headers.insert(HeaderName::from_static(X_USER_EMAIL), value);
            }
            if let Ok(value) = HeaderValue::from_str(role) {
                headers.insert(HeaderName::from_static(X_USER_ROLE), value);
            }
        }
        Principal::ApiKey { fingerprint, .. } => {
            let hex = edgerouter_security::hex_encode(fingerprint);
            headers.insert(
                HeaderName::from_static(X_API_KEY_HASH),
                HeaderValue::from_str(&hex).expect("hex digest is a valid header value"),
            );
        }
        Principal::Anonymous => {}
    }
}

async fn relay(response: reqwest::Response) -> Result<Response, ApiError> {
    let status = response.status();
    let mut headers = response.headers().clone();
    headers.retain(|name, _| !is_hop_by_hop(name.as_str()));

    let body = response
        .bytes()
        .await
        .map_err(|err| ApiError::service_unavailable(format!("failed to read upstream body: {err}")))?;

    let axum_status = axum::http::StatusCode::from_u16(status.as_u16())
        .unwrap_or(axum::http::StatusCode::BAD_GATEWAY);

    let mut built = (axum_status, body).into_response();
    *built.headers_mut() = headers;
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn ctx(principal: Principal) -> RequestContext {
        let mut c = RequestContext::new("corr-1".into(), "203.0.113.7".parse::<IpAddr>().unwrap());
        c.principal = principal;
        c
    }

    #[test]
    fn anonymous_principal_injects_only_correlation_and_ip_headers() {
        let mut headers = HeaderMap::new();
        apply_principal_headers(&ctx(Principal::Anonymous), &mut headers);

        assert_eq!(headers.get(X_REQUEST_ID).unwrap(), "corr-1");
        assert_eq!(headers.get(X_REAL_IP).unwrap(), "203.0.113.7");
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "203.0.113.7");
        assert!(headers.get(X_USER_ID).is_none());
        assert!(headers.get(X_API_KEY_HASH).is_none());
    }

    #[test]
    fn bearer_principal_injects_user_headers() {
        let principal = Principal::Bearer {
            user_id: 42,
            email: "u@x.com".into(),
            role: "admin".into(),
        };
        let mut headers = HeaderMap::new();
        apply_principal_headers(&ctx(principal), &mut headers);

        assert_eq!(headers.get(X_USER_ID).unwrap(), "42");
        assert_eq!(headers.get(X_USER_EMAIL).unwrap(), "u@x.com");
        assert_eq!(headers.get(X_USER_ROLE).unwrap(), "admin");
    }

    #[test]
    fn api_key_principal_injects_fingerprint_hash_only() {
        let principal = Principal::ApiKey {
            fingerprint: edgerouter_security::fingerprint("cp_abc123"),
            display_prefix: "cp_abc123de".into(),
        };
        let mut headers = HeaderMap::new();
        apply_principal_headers(&ctx(principal), &mut headers);

        assert_eq!(
            headers.get(X_API_KEY_HASH).unwrap(),
            &edgerouter_security::fingerprint_hex("cp_abc123")
        );
        assert!(headers.get(X_USER_ID).is_none());
    }

    #[test]
    fn forwarded_for_appends_to_existing_chain() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("198.51.100.1"));
        apply_principal_headers(&ctx(Principal::Anonymous), &mut headers);

        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "198.51.100.1, 203.0.113.7");
    }

    #[test]
    fn real_ip_overwrites_any_inbound_value() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("9.9.9.9"));
        apply_principal_headers(&ctx(Principal::Anonymous), &mut headers);

        assert_eq!(headers.get(X_REAL_IP).unwrap(), "203.0.113.7");
    }
}
