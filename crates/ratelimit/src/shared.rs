//! Shared rate-limit store for multi-instance deployments, speaking a
//! minimal RESP subset over a persistent TCP connection (see
//! [`crate::resp`]).
//!
//! Grounded in `DokaIzk-StellarRoute`'s `RateLimitMiddleware`, which
//! holds a pooled Redis connection behind a `Backend::Redis` variant and
//! falls back to an in-memory store on error. This keeps the same
//! fail-open contract (spec.md §4.2: "if the store is unreachable, fail
//! open and log at warn level, throttled to once per 30 seconds") but
//! talks RESP directly instead of depending on the `redis` crate, since
//! the teacher repo carries no such dependency.

use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

use crate::resp::{self, Reply};
use crate::{RateLimitDecision, RateLimiter};

const WARN_THROTTLE: Duration = Duration::from_secs(30);

/// A RESP-speaking rate limiter backed by a single shared connection.
/// Reconnects lazily after any I/O error; on failure the request is
/// allowed through (fail open) rather than rejected.
pub struct SharedRateLimiter {
    host: String,
    port: u16,
    password: Option<String>,
    db: i64,
    requests: u32,
    window: Duration,
    conn: AsyncMutex<Option<BufReader<TcpStream>>>,
    last_warn: StdMutex<Option<Instant>>,
}

impl SharedRateLimiter {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        password: Option<String>,
        db: i64,
        requests: u32,
        window: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            password,
            db,
            requests,
            window,
            conn: AsyncMutex::new(None),
            last_warn: StdMutex::new(None),
        }
    }

    async fn connect(&self) -> std::io::Result<BufReader<TcpStream>> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let mut stream = BufReader::new(stream);
        if let Some(password) = &self.password {
            resp::send_command(&mut stream, &["AUTH", password]).await?;
            expect_ok(&mut stream).await?;
        }
        if self.db != 0 {
            let db = self.db.to_string();
            resp::send_command(&mut stream, &["SELECT", &db]).await?;
            expect_ok(&mut stream).await?;
        }
        Ok(stream)
    }

    async fn try_check(&self, key: &str) -> std::io::Result<RateLimitDecision> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        let stream = guard.as_mut().expect("just populated above");

        let window_secs = self.window.as_secs().to_string();
        resp::send_pipeline(
            stream,
            &[
                vec!["INCR".to_string(), key.to_string()],
                vec!["EXPIRE".to_string(), key.to_string(), window_secs],
            ],
        )
        .await?;

        let count = match resp::read_reply(stream).await? {
            Reply::Integer(n) if n >= 0 => n as u32,
            other => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("unexpected INCR reply: {other:?}"),
                ));
            }
        };
        resp::read_reply(stream).await?; // EXPIRE reply, discarded

        let allowed = count <= self.requests;
        let remaining = self.requests.saturating_sub(count);

        Ok(RateLimitDecision {
            allowed,
            limit: self.requests,
            remaining,
            reset_seconds: self.window.as_secs(),
        })
    }

    fn warn_throttled(&self, err: &std::io::Error) {
        let mut last = self.last_warn.lock().expect("warn mutex poisoned");
        let now = Instant::now();
        let should_log = match *last {
            Some(prev) => now.duration_since(prev) >= WARN_THROTTLE,
            None => true,
        };
        if should_log {
            warn!(error = %err, "shared rate limit store unreachable, failing open");
            *last = Some(now);
        }
    }
}

async fn expect_ok(stream: &mut BufReader<TcpStream>) -> std::io::Result<()> {
    match resp::read_reply(stream).await? {
        Reply::Simple(_) => Ok(()),
        Reply::Error(msg) => Err(std::io::Error::new(std::io::ErrorKind::Other, msg)),
        other => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unexpected reply: {other:?}"),
        )),
    }
}

#[async_trait]
impl RateLimiter for SharedRateLimiter {
    async fn check(&self, key: &str) -> RateLimitDecision {
        match self.try_check(key).await {
            Ok(decision) => decision,
            Err(err) => {
                self.warn_throttled(&err);
                *self.conn.lock().await = None; // force reconnect next call
                RateLimitDecision {
                    allowed: true,
                    limit: self.requests,
                    remaining: self.requests,
                    reset_seconds: self.window.as_secs(),
                }
            }
        }
    }
}
