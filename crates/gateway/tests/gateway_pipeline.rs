//! End-to-end pipeline tests: a real router built from `AppState`,
//! driven with `tower::ServiceExt::oneshot`, forwarding to in-process stub
//! upstreams. Mirrors the oneshot-driven integration style used for the
//! other HTTP services in this codebase's surrounding ecosystem.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower::ServiceExt;

use edgerouter_config::AppConfig;
use edgerouter_gateway::{AppState, build_router};

// Environment variables are process-global; serialize every test that
// loads configuration so they don't clobber each other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "GATEWAY_PORT",
        "GATEWAY_ENV",
        "AUTH_SERVICE_URL",
        "CAPTCHA_SERVICE_URL",
        "JWT_SECRET",
        "CORS_ORIGINS",
        "RATE_LIMIT_REQUESTS",
        "RATE_LIMIT_WINDOW_SECONDS",
        "REDIS_HOST",
    ] {
        unsafe { std::env::remove_var(key) };
    }
}

fn set_env(auth_url: &str, captcha_url: &str) {
    unsafe {
        std::env::set_var("AUTH_SERVICE_URL", auth_url);
        std::env::set_var("CAPTCHA_SERVICE_URL", captcha_url);
        std::env::set_var("JWT_SECRET", "a".repeat(32));
    }
}

/// A stub upstream that echoes back 200 + the headers it received (as a
/// JSON map) so tests can assert on what the forwarder injected.
#[derive(Clone, Default)]
struct CapturedHeaders(Arc<Mutex<Option<HeaderMap>>>);

async fn spawn_echo_stub(path: &'static str) -> (String, CapturedHeaders) {
    let captured = CapturedHeaders::default();
    let captured_for_handler = captured.clone();

    async fn handler(State(captured): State<CapturedHeaders>, headers: HeaderMap) -> Json<serde_json::Value> {
        *captured.0.lock().unwrap() = Some(headers);
        Json(serde_json::json!({ "ok": true }))
    }

    let app = Router::new()
        .route(path, get(handler).post(handler))
        .with_state(captured_for_handler);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), captured)
}

async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn health_check_returns_200_without_touching_upstreams() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    set_env("http://127.0.0.1:1", "http://127.0.0.1:1");

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "healthy");
}

#[tokio::test]
async fn open_login_route_forwards_to_identity_service() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let (identity_url, captured) = spawn_echo_stub("/api/v1/auth/login").await;
    set_env(&identity_url, "http://127.0.0.1:1");

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"email":"a@b.com","password":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(captured.0.lock().unwrap().is_some(), "stub never received the forwarded request");
}

#[tokio::test]
async fn auth_me_without_bearer_is_rejected_before_forwarding() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let (identity_url, captured) = spawn_echo_stub("/api/v1/auth/me").await;
    set_env(&identity_url, "http://127.0.0.1:1");

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        captured.0.lock().unwrap().is_none(),
        "identity service should never be called when auth fails"
    );
}

#[tokio::test]
async fn api_key_solve_request_injects_fingerprint_hash_header() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let (solver_url, captured) = spawn_echo_stub("/api/v1/captcha/solve").await;
    set_env("http://127.0.0.1:1", &solver_url);

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/captcha/solve")
                .header("x-api-key", "cp_livekey_abc123")
                .body(Body::from(r#"{"image":"base64"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = captured.0.lock().unwrap().clone().expect("solver should have received the request");
    assert!(headers.get("x-api-key-hash").is_some());
    assert!(headers.get("x-api-key").is_none(), "raw API key must not reach the upstream");
}

#[tokio::test]
async fn exceeding_the_rate_limit_returns_429() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let (identity_url, _captured) = spawn_echo_stub("/api/v1/auth/login").await;
    set_env(&identity_url, "http://127.0.0.1:1");
    unsafe {
        std::env::set_var("RATE_LIMIT_REQUESTS", "2");
        std::env::set_var("RATE_LIMIT_WINDOW_SECONDS", "60");
    }

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert_eq!(statuses[0], StatusCode::OK);
    assert_eq!(statuses[1], StatusCode::OK);
    assert_eq!(statuses[2], StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unmatched_route_404s_without_consuming_a_rate_limit_slot() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let (identity_url, _captured) = spawn_echo_stub("/api/v1/auth/login").await;
    set_env(&identity_url, "http://127.0.0.1:1");
    unsafe {
        std::env::set_var("RATE_LIMIT_REQUESTS", "1");
        std::env::set_var("RATE_LIMIT_WINDOW_SECONDS", "60");
    }

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/no-such-route").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // The limit is still untouched: a real request right after should pass.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn preflight_options_returns_204() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    set_env("http://127.0.0.1:1", "http://127.0.0.1:1");
    unsafe {
        std::env::set_var("CORS_ORIGINS", "https://dashboard.example.com");
    }

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/auth/login")
                .header("origin", "https://dashboard.example.com")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get("access-control-allow-origin").is_some());
}

#[tokio::test]
async fn unreachable_upstream_maps_to_502() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let dead_addr = unused_addr().await;
    set_env("http://127.0.0.1:1", &format!("http://{dead_addr}"));

    let config = AppConfig::load().unwrap();
    let app = build_router(AppState::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/captcha/solve")
                .header("x-api-key", "cp_livekey_abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
