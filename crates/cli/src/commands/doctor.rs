//! `edgerouter doctor` — diagnose the environment without starting the
//! listener (spec.md §6; useful for container healthchecks/CI).

use edgerouter_config::AppConfig;

pub fn run() {
    println!("edgerouter doctor");
    println!("=================\n");

    let mut issues = 0;

    match AppConfig::load() {
        Ok(config) => {
            println!("  [ok] configuration loads and validates");

            if config.cors_origins.is_empty() {
                println!("  [warn] CORS_ORIGINS is empty — browser clients will be rejected");
            }

            match &config.redis {
                Some(redis) => println!("  [ok] rate limiting backed by redis at {}:{}", redis.host, redis.port),
                None => println!("  [warn] rate limiting is per-process only — state resets on restart and does not share across replicas"),
            }

            if !config.is_production() {
                println!("  [warn] GATEWAY_ENV is not \"production\" — Strict-Transport-Security will not be sent");
            }
        }
        Err(err) => {
            println!("  [error] {err}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("no blocking issues found");
    } else {
        println!("{issues} issue(s) found");
        std::process::exit(1);
    }
}
