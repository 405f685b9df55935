//! Shared application state handed to every handler and middleware stage.

use std::sync::Arc;

use edgerouter_config::AppConfig;
use edgerouter_core::RouteTable;
use edgerouter_ratelimit::{LocalRateLimiter, RateLimiter, SharedRateLimiter};

use crate::forward::Forwarder;

/// Everything a request needs that outlives the request itself: config,
/// the route table, the pooled upstream client, and the selected
/// rate-limit backend.
///
/// Cheap to clone — every field is an `Arc` or a small `Copy`/owned value
/// behind one, so axum's per-request `State` extraction never deep-copies.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub routes: Arc<RouteTable>,
    pub forwarder: Arc<Forwarder>,
    pub limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let limiter: Arc<dyn RateLimiter> = match &config.redis {
            Some(redis) => Arc::new(SharedRateLimiter::new(
                redis.host.clone(),
                redis.port,
                redis.password.clone(),
                redis.db,
                config.rate_limit_requests,
                config.rate_limit_window,
            )),
            None => LocalRateLimiter::spawn(config.rate_limit_requests, config.rate_limit_window),
        };

        Self {
            forwarder: Arc::new(Forwarder::new()),
            routes: Arc::new(edgerouter_core::default_routes()),
            limiter,
            config: Arc::new(config),
        }
    }
}
