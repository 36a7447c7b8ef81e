use axum::{routing::get, Router};
use dotenvy::dotenv;
use std::{env, net::SocketAddr, sync::Arc};
use tracing_subscriber;
use anyhow::Result;

mod cycle;
mod models;
mod routes;
mod store;
mod tracker;

use store::cache::EntryCache;
use store::memory::MemoryEntryStore;
use store::postgres::PgEntryStore;
use store::EntryStore;
use tracker::PeriodTracker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cache_dir = env::var("BLOOMDAYS_CACHE_DIR").unwrap_or_else(|_| "data".into());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3050);

    let store = connect_store().await;
    let tracker = Arc::new(PeriodTracker::new(store, EntryCache::new(cache_dir)));

    let app = Router::new()
        .merge(routes::entries::routes(tracker.clone()))
        .merge(routes::cycle::routes(tracker.clone()))
        .merge(routes::calendar::routes(tracker.clone()))
        .route("/health", get(|| async { "✅ Backend up" }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🌸 Server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}

/// Postgres when reachable, in-memory otherwise. A missing or unreachable
/// database never stops the server; it keeps answering from local data.
async fn connect_store() -> Arc<dyn EntryStore> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::info!("ℹ️ DATABASE_URL not set, using in-memory store");
            return Arc::new(MemoryEntryStore::new());
        }
    };

    match PgEntryStore::connect(&database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("❌ DB unreachable, falling back to in-memory store: {}", e);
            Arc::new(MemoryEntryStore::new())
        }
    }
}
