//! Command-line driver for the job-board client.

mod commands;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{App, Cli};

fn init_tracing() {
    // JSON for log shipping, human-readable otherwise. Logs go to stderr so
    // command output stays clean.
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobboard=info,warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = Cli::parse().command;

    let app = match App::from_env() {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(command = command.name(), "Running command");
    if let Err(e) = app.run(command).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
