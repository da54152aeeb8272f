//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::auth::JwtValidator;
use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use reelvault_catalog::PgVideoCatalog;
use reelvault_core::Config;
use reelvault_storage::create_store;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Initialize the application: database, storage, state, and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(&config.database_url)
        .await?;

    reelvault_catalog::MIGRATOR.run(&pool).await?;
    tracing::info!("Database migrations applied");

    let storage = create_store(&config).await?;
    let catalog = Arc::new(PgVideoCatalog::new(pool));
    let credentials = Arc::new(JwtValidator::new(&config.jwt_secret));

    let state = Arc::new(AppState {
        config: config.clone(),
        catalog,
        storage,
        credentials,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
