mod cache;
mod config;
mod db;
mod employee;
mod errors;
mod models;
mod pages;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{Cache, MemoryCache, RedisCache};
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::employee::catalog::CatalogSource;
use crate::employee::lookup::PreferenceLookup;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting onboarding API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and bring the schema up to date
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize the lookup cache
    let ttl = config.cache_ttl_secs.map(Duration::from_secs);
    let cache: Arc<dyn Cache> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Redis cache initialized");
            Arc::new(RedisCache::new(client, ttl))
        }
        None => {
            warn!("REDIS_URL not set, caching lookups in process memory");
            Arc::new(MemoryCache::new(ttl))
        }
    };

    let source: Arc<dyn CatalogSource> = Arc::new(db.clone());
    let lookup = PreferenceLookup::new(cache, source);

    // Build app state
    let state = AppState { db, lookup };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
