//! Billing pass-through service - Main Application Entry Point
//!
//! REST API that forwards billing requests to a payment processor: the
//! deposit account of a provider and the card on file of a subscriber.
//! Card and bank details are never stored here; the processor is the source
//! of truth.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, for organization lookup only
//! - **Processor**: Stripe over reqwest, or an in-memory sandbox
//! - **Authentication**: done upstream, caller forwarded in a header
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Build the processor backend
//! 4. Build HTTP router and start serving

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod processors;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{services::organization_store::PgOrganizationStore, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let processor = processors::from_config(&config)?;
    tracing::info!(processor = processor.name(), "Processor backend ready");

    let state = AppState {
        organizations: Arc::new(PgOrganizationStore::new(pool)),
        processor,
        broker_slug: config.broker_slug.clone(),
        actor_header: config.actor_header.clone(),
    };
    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
