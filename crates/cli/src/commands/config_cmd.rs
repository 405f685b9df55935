//! `edgerouter config` — load and inspect the resolved configuration
//! without starting the listener (spec.md §6, the container-healthcheck
//! "config validate" entry point).

use edgerouter_config::AppConfig;

pub fn validate() {
    match AppConfig::load() {
        Ok(config) => {
            println!("config OK");
            println!("  port:                {}", config.port);
            println!("  environment:         {:?}", config.env);
            println!("  auth_service_url:    {}", config.auth_service_url);
            println!("  captcha_service_url: {}", config.captcha_service_url);
            println!("  rate_limit:          {} req / {:?}", config.rate_limit_requests, config.rate_limit_window);
            println!(
                "  rate_limit backend:  {}",
                if config.redis.is_some() { "shared (redis)" } else { "local (in-process)" }
            );
            if config.cors_origins.iter().any(|o| o == "*") {
                println!("  warning: CORS_ORIGINS includes \"*\" — any origin is reflected");
            }
        }
        Err(err) => {
            eprintln!("config error: {err}");
            std::process::exit(1);
        }
    }
}

pub fn show() {
    match AppConfig::load() {
        Ok(config) => println!("{config:#?}"),
        Err(err) => {
            eprintln!("config error: {err}");
            std::process::exit(1);
        }
    }
}
