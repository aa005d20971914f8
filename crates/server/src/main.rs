//! spielplan-api server entry point.
//!
//! Boots the read-only HTTP API over the cached crawler: loads the
//! configuration, restores the persisted caches, starts the prewarm loop
//! when configured, serves until shutdown, and persists the caches on the
//! way out.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use spielplan_client::{CachedClient, Crawler, FetchConfig};
use spielplan_core::{AppConfig, ContentStore};

mod auth;
mod error;
mod prewarm;
mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::load()?;

    let store = ContentStore::open(&config.cache_dir)?;
    let client = Arc::new(CachedClient::new(
        FetchConfig {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_entries: config.max_entries,
            ..Default::default()
        },
        store,
    )?);
    let crawler = Arc::new(Crawler::new(Arc::clone(&client), config.ttls()));
    let state = state::AppState::new(config.clone(), client, crawler);

    state.load_caches().await;

    match &config.prewarm_club_id {
        Some(club_id) => {
            tokio::spawn(prewarm::run(state.clone(), club_id.clone()));
        }
        None => {
            tracing::info!("cache pre-warming is disabled; set SPIELPLAN_PREWARM_CLUB_ID to enable it");
        }
    }

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, routes::router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.save_caches().await;
    tracing::info!("persistent cache saved; bye");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("shutdown signal received");
}
