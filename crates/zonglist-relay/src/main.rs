//! Relay server for a shared in-car queue.
//!
//! Run with: cargo run -p zonglist-relay
//!
//! Driver and passengers connect to `ws://localhost:3000/ws/{session_id}`.

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonglist_core::ClientContext;
use zonglist_resolver::{MetadataResolver, StaticResolver, YouTubeClient};
use zonglist_session::{AutoAdvance, SessionManager, storage::MemoryStore};
use zonglist_transport::websocket::{RelayState, create_router};

use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let store = Arc::new(MemoryStore::new());
    let driver = SessionManager::new(store).with_context(ClientContext::new("driver"));

    // The store lives in this process, so every start is a fresh session
    driver
        .initialize_session(&args.session_id, args.driver_info())
        .await
        .context("failed to initialize session")?;

    let _auto_advance = AutoAdvance::spawn(driver.clone(), args.session_id.clone(), args.auto_advance())
        .await
        .context("failed to start auto-advance")?;

    let resolver: Arc<dyn MetadataResolver> = match args.api_key() {
        Some(key) => Arc::new(
            YouTubeClient::builder()
                .api_key(key)
                .build()
                .context("failed to build YouTube client")?,
        ),
        None => {
            tracing::warn!("YOUTUBE_API_KEY not set, search will return no results");
            Arc::new(StaticResolver::default())
        }
    };

    let state = RelayState::new(args.session_id.clone(), driver, resolver);
    let app = create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("Relay listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
