// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account Resolver API Server
//!
//! Links identity-provider logins to local users and serves the session
//! user's profile.

use account_resolver::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, RecordStore},
    services::AccountResolver,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        "Starting Account Resolver API"
    );

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        accounts: AccountResolver::new(store),
    });

    // Build router
    let app = account_resolver::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("account_resolver=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
