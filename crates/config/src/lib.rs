//! Configuration loading and validation for the edge request router.
//!
//! Unlike the teacher's `AppConfig` (which reads `~/.rustedclaw/config.toml`
//! with environment overrides), the router takes its settings entirely
//! from the environment, per spec.md §6 — fitting a container-first
//! deployment with no config file to mount. The redacted `Debug` impl and
//! "validate at startup, fail fast" shape both carry over unchanged.

use std::fmt;
use std::time::Duration;

use edgerouter_security::MIN_SECRET_LEN;

/// Deployment environment, selecting the log format ([`AppConfig::env`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// The router's full runtime configuration, loaded once at startup and
/// shared read-only (wrapped in `Arc`) for the life of the process.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub env: Environment,
    pub auth_service_url: String,
    pub captcha_service_url: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
    pub redis: Option<RedisConfig>,
    pub log_level: String,
}

/// Connection settings for the shared rate-limit store. `None` when
/// `REDIS_HOST` is unset, in which case the gateway falls back to
/// [`edgerouter_ratelimit::LocalRateLimiter`].
#[derive(Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("env", &self.env)
            .field("auth_service_url", &self.auth_service_url)
            .field("captcha_service_url", &self.captcha_service_url)
            .field("jwt_secret", &edgerouter_security::redact::redact_option(&Some(self.jwt_secret.clone())))
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("redis", &self.redis)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &edgerouter_security::redact::redact_option(&self.password))
            .field("db", &self.db)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the environment, then validate it.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn from_env() -> Result<Self, ConfigError> {
        let port = env_or("GATEWAY_PORT", "8080").parse().map_err(|_| ConfigError::Invalid {
            var: "GATEWAY_PORT",
            reason: "must be a valid port number".into(),
        })?;

        let env = Environment::parse(&env_or("GATEWAY_ENV", "development"));

        let auth_service_url = require_env("AUTH_SERVICE_URL")?;
        let captcha_service_url = require_env("CAPTCHA_SERVICE_URL")?;
        let jwt_secret = require_env("JWT_SECRET")?;

        let cors_origins = env_or("CORS_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let rate_limit_requests = env_or("RATE_LIMIT_REQUESTS", "60")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: "RATE_LIMIT_REQUESTS",
                reason: "must be a positive integer".into(),
            })?;

        let rate_limit_window_secs: u64 = env_or("RATE_LIMIT_WINDOW_SECONDS", "60")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: "RATE_LIMIT_WINDOW_SECONDS",
                reason: "must be a positive integer".into(),
            })?;

        let redis = match std::env::var("REDIS_HOST").ok() {
            Some(host) if !host.is_empty() => {
                let port = env_or("REDIS_PORT", "6379").parse().map_err(|_| ConfigError::Invalid {
                    var: "REDIS_PORT",
                    reason: "must be a valid port number".into(),
                })?;
                let db = env_or("REDIS_DB", "0").parse().map_err(|_| ConfigError::Invalid {
                    var: "REDIS_DB",
                    reason: "must be a non-negative integer".into(),
                })?;
                Some(RedisConfig {
                    host,
                    port,
                    password: std::env::var("REDIS_PASSWORD").ok().filter(|s| !s.is_empty()),
                    db,
                })
            }
            _ => None,
        };

        let log_level = env_or("LOG_LEVEL", "info");

        Ok(Self {
            port,
            env,
            auth_service_url,
            captcha_service_url,
            jwt_secret,
            cors_origins,
            rate_limit_requests,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            redis,
            log_level,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        if self.rate_limit_requests == 0 {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_REQUESTS",
                reason: "must be greater than zero".into(),
            });
        }
        if self.auth_service_url.parse::<http::Uri>().is_err() {
            return Err(ConfigError::Invalid {
                var: "AUTH_SERVICE_URL",
                reason: "must be a valid URL".into(),
            });
        }
        if self.captcha_service_url.parse::<http::Uri>().is_err() {
            return Err(ConfigError::Invalid {
                var: "CAPTCHA_SERVICE_URL",
                reason: "must be a valid URL".into(),
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.env == Environment::Production
    }
}

fn env_or(key: &'static str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that
    // touch them so they don't race each other.
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
            "REDIS_PORT",
            "REDIS_PASSWORD",
            "REDIS_DB",
            "LOG_LEVEL",
        ] {
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_required_env() {
        unsafe {
            std::env::set_var("AUTH_SERVICE_URL", "http://identity.internal:9001");
            std::env::set_var("CAPTCHA_SERVICE_URL", "http://solver.internal:9002");
            std::env::set_var("JWT_SECRET", "a".repeat(32));
        }
    }

    #[test]
    fn loads_with_defaults_when_optional_vars_are_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required_env();

        let config = AppConfig::load().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.rate_limit_requests, 60);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
        assert!(config.redis.is_none());
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required_env();
        unsafe { std::env::set_var("JWT_SECRET", "too-short") };

        let err = AppConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "JWT_SECRET", .. }));
    }

    #[test]
    fn rejects_missing_auth_service_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("CAPTCHA_SERVICE_URL", "http://solver.internal:9002");
            std::env::set_var("JWT_SECRET", "a".repeat(32));
        }

        let err = AppConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_SERVICE_URL")));
    }

    #[test]
    fn parses_cors_origins_list() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required_env();
        unsafe { std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example") };

        let config = AppConfig::load().unwrap();
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn builds_redis_config_when_host_is_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required_env();
        unsafe {
            std::env::set_var("REDIS_HOST", "redis.internal");
            std::env::set_var("REDIS_PORT", "6380");
            std::env::set_var("REDIS_DB", "2");
        }

        let config = AppConfig::load().unwrap();
        let redis = config.redis.expect("redis config should be present");
        assert_eq!(redis.host, "redis.internal");
        assert_eq!(redis.port, 6380);
        assert_eq!(redis.db, 2);
        assert!(redis.password.is_none());
    }

    #[test]
    fn debug_output_redacts_jwt_secret() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required_env();

        let config = AppConfig::load().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(&config.jwt_secret));
        assert!(rendered.contains("[REDACTED]"));
    }
}
