mod build;
mod config;
mod content;
mod errors;
mod layout;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::build::assets::HttpAssetFetcher;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bookbinder API v{}", env!("CARGO_PKG_VERSION"));

    let fetcher = HttpAssetFetcher::new(
        Duration::from_secs(config.asset_fetch_timeout_secs),
        config.max_asset_bytes,
    )?;
    info!(
        "Asset fetcher initialized (timeout {}s, limit {} bytes)",
        config.asset_fetch_timeout_secs, config.max_asset_bytes
    );

    let layout_defaults = config.layout_defaults();
    layout_defaults.validate()?;
    info!(
        "Layout defaults: {}x{}pt, body {}pt",
        layout_defaults.page_width_pt, layout_defaults.page_height_pt, layout_defaults.body_size_pt
    );

    let state = AppState {
        config: config.clone(),
        fetcher: Arc::new(fetcher),
        layout_defaults,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once a front end is deployed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
