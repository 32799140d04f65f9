//! Larkbot - Lark chat bot server binary.

use std::process::ExitCode;

use clap::Parser;
use larkbot::LarkConfig;
use larkbot::config::LarkConfigMetadata;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use larkbot_server::{DEFAULT_LISTEN_ADDR, ServerConfig, log_level, run_with_shutdown};

/// Lark chat bot
#[derive(Parser)]
#[command(name = "larkbot")]
#[command(about = "Lark chat bot answering commands and relaying JSON-RPC messages")]
#[command(version)]
struct Args {
    /// Application id
    #[arg(long, env = "LARK_APP_ID")]
    app_id: String,

    /// Application secret
    #[arg(long, env = "LARK_APP_SECRET", hide_env_values = true)]
    app_secret: String,

    /// Listen address
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Log verbosity: debug, info, notice, warning, error or critical
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    /// Comma-separated open ids allowed to manage chats; empty means everyone
    #[arg(long, env = "LARK_MASTERS", default_value = "")]
    masters: String,

    /// Override the open API endpoint prefix
    #[arg(long, env = "LARK_API_BASE")]
    api_base: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
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

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(log_level(&args.verbosity), args.json_logs);

    let mut lark = LarkConfig::new(args.app_id, args.app_secret).with_masters(&args.masters);
    if let Some(api_base) = args.api_base {
        lark = lark.with_api_base(api_base);
    }
    match serde_json::to_string(&LarkConfigMetadata::from(&lark)) {
        Ok(metadata) => info!("Lark application: {}", metadata),
        Err(e) => error!("Failed to describe configuration: {}", e),
    }

    let config = ServerConfig::new(lark).with_listen_addr(args.listen);
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }
    info!("Press Ctrl+C to stop");

    let shutdown = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
            _ = terminate => info!("Received SIGTERM, shutting down"),
        }
    };

    if let Err(e) = run_with_shutdown(config, shutdown).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}
