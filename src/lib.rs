pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod models;
pub mod query;
pub mod scheduler;
pub mod scraping;
pub mod search;
pub mod service;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use aggregator::Aggregator;
use cache::{EventCache, SystemClock, DEFAULT_FLUSH_INTERVAL, DEFAULT_TTL};
use config::AppConfig;
use enrich::Enricher;
use scraping::base::HttpFetcher;
use search::TavilyProvider;
use service::EventService;

pub fn build_service(config: &AppConfig) -> Result<EventService> {
    let fetcher = HttpFetcher::new()?;
    let provider = TavilyProvider::with_endpoint(&config.search_api_key, &config.search_endpoint)
        .context("unable to build search client")?;

    Ok(EventService::new(
        Aggregator::new(scraping::default_sources(), Arc::new(fetcher)),
        Enricher::new(Arc::new(provider)),
        Arc::new(EventCache::new(Arc::new(SystemClock), DEFAULT_TTL)),
    ))
}

pub async fn run(config: AppConfig) -> Result<()> {
    let service = Arc::new(build_service(&config)?);
    scheduler::init(service.cache(), DEFAULT_FLUSH_INTERVAL);

    let app = api::router(service);
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("server running on http://{addr}");
    info!("available endpoints:");
    info!("- GET /api/events");
    info!("- GET /api/events/date/:date (YYYY-MM-DD)");
    info!("- GET /api/events/search?q=&category=&city=&date=");
    info!("- GET /api/events/sources");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
