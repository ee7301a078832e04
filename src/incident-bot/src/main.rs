//! Incident Bot - Slack webhook server binary.

use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use incident_bot::{BotConfig, run_with_shutdown};

/// Incident Bot
#[derive(Parser)]
#[command(name = "incident-bot")]
#[command(about = "Slack webhook server for declaring and tracking incidents")]
#[command(version)]
struct Args {
    /// Listen address (overrides INCIDENT_LISTEN_ADDR)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    /// Create incident channels as private channels
    #[arg(long)]
    private_channels: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may be set directly.
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    setup_logging(&args.log_level, args.json_logs);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let mut config = match BotConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config from environment: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if args.private_channels {
        config.private_channels = true;
    }

    info!("Press Ctrl+C to stop");

    if let Err(e) = run_with_shutdown(config, shutdown_signal()).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}
