//! Edge Request Router CLI — the process entry point.
//!
//! Commands:
//! - `serve`  — start the HTTP gateway (the default when no subcommand is given)
//! - `config` — validate or print the resolved configuration
//! - `doctor` — diagnose the environment without starting the listener

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "edgerouter",
    about = "Edge Request Router — the single HTTP entry point in front of the identity and solver services",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug-level logging regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway and block until shutdown
    Serve,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose the environment without starting the listener
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate configuration, printing a report
    Validate,
    /// Print the resolved configuration (secrets redacted)
    Show,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = edgerouter_config::AppConfig::load().unwrap_or_else(|err| {
                tracing::error!(%err, "invalid configuration, refusing to start");
                std::process::exit(1);
            });
            edgerouter_gateway::start(config).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate(),
            ConfigAction::Show => commands::config_cmd::show(),
        },
        Commands::Doctor => commands::doctor::run(),
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let is_production = std::env::var("GATEWAY_ENV")
        .map(|v| v.eq_ignore_ascii_case("production") || v.eq_ignore_ascii_case("prod"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if is_production {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
