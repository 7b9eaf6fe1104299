//! Carpool - seat coordination for group rides
//!
//! A conversational service where participants register drivers with a
//! number of seats and passengers claim those seats, one conversation at a
//! time, against a shared driver registry.

mod api;
mod config;
mod db;
mod registry;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use db::Database;
use runtime::{DatabaseStorage, RuntimeManager, RuntimeSettings};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carpool=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let settings = RuntimeSettings {
        restore_seats_on_reset: config.restore_seats_on_reset,
        idle_timeout: config.idle_timeout,
    };
    let runtime =
        RuntimeManager::load(DatabaseStorage::new(db), config.registry_scope, settings).await?;

    // Create application state
    let state = AppState::new(runtime);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        %addr,
        scope = ?config.registry_scope,
        restore_seats_on_reset = config.restore_seats_on_reset,
        idle_timeout_secs = config.idle_timeout.map(|idle| idle.as_secs()),
        "Carpool server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
