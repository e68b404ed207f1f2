//! quota_ledger: event-sourced per-account usage quota ledger
//!
//! Tracks metered usage against a plan over a billing period using an
//! event-sourced aggregate, with optimistic concurrency control and
//! idempotent writes.

use std::net::SocketAddr;

use axum::{middleware, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;

pub mod aggregate;
pub mod api;
mod config;
mod db;
pub mod domain;
mod error;
pub mod event_store;
pub mod handlers;
pub mod projection;

pub use config::Config;
pub use error::{AppError, AppResult};

use handlers::AccountService;

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quota_ledger=debug,tower_http=debug".into()),
        )
        .init();
}

/// Build the application router.
fn build_router(service: AccountService) -> Router {
    api::create_router()
        .layer(middleware::from_fn(api::middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("starting quota_ledger");
    tracing::info!("connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    db::bootstrap_schema(&pool).await?;
    tracing::info!("database schema ready");

    let service = AccountService::new(pool.clone());
    let app = build_router(service);

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutting down...");
    pool.close().await;
    tracing::info!("database connections closed. goodbye!");

    Ok(())
}

/// Graceful shutdown on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received ctrl-c, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown...");
        },
    }
}
