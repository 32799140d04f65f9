//! Larkbot Server - HTTP front end for the Lark chat bot.
//!
//! This crate provides:
//! - The event subscription endpoint (`/events/`) that runs chat commands
//! - A JSON-RPC 1.0 endpoint (`/jsonrpc/`) for pushing messages into chats
//! - A `/204/` liveness endpoint
//! - Background refresh of the tenant access token

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod jsonrpc;
pub mod middleware;
pub mod state;
pub mod token;

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, post};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::{DEFAULT_LISTEN_ADDR, ServerConfig, log_level};
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Run the server until `shutdown` resolves.
pub async fn run_with_shutdown<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState::new(config.clone())?);

    match config.lark.masters().len() {
        0 => info!("Serving for all users"),
        n => info!("Serving for {} users", n),
    }

    let (stop_tx, stop_rx) = broadcast::channel(1);
    let refresher = tokio::spawn(token::refresh_loop(
        Arc::clone(&state.api),
        config.token,
        stop_rx,
    ));

    let app = create_router(state);
    let addr = config.socket_addr()?;
    info!("Starting larkbot server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = stop_tx.send(());
        })
        .await?;

    info!("Server shutting down");
    refresher.await?;

    Ok(())
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/events/",
            post(handlers::handle_events).fallback(handlers::not_found),
        )
        .route(
            "/jsonrpc/",
            post(jsonrpc::handle_jsonrpc).fallback(handlers::not_found),
        )
        .route("/204/", any(handlers::no_content))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(middleware::log_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
