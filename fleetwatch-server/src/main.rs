use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod sampler;
pub mod service;

use std::sync::Arc;

use crate::api::AppState;
use crate::config::Config;
use crate::repository::{OutageStore, PgOutageStore};
use crate::sampler::{HttpSampleSource, SamplePoller};
use crate::service::outage_tracker::OutageTracker;
use crate::service::report_jobs::ReportJobManager;
use crate::service::status::StatusCache;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetwatch_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fleetwatch server...");

    let config = Config::from_env();

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let store: Arc<dyn OutageStore> = Arc::new(PgOutageStore::new(pool));

    // Rebuild per-worker outage state from records left open across restarts
    let tracker = OutageTracker::recover(Arc::clone(&store))
        .await
        .expect("Failed to recover outage state");
    tracing::info!("Recovered {} open outage(s)", tracker.open_count());
    let tracker = Arc::new(tokio::sync::Mutex::new(tracker));

    let status = Arc::new(StatusCache::new());
    let reports = Arc::new(ReportJobManager::new(
        config.report_worker_bin.clone(),
        config.database_url.clone(),
    ));

    // The upstream poller is optional; samples can also be pushed through the API
    if let Some(url) = config.upstream_status_url.clone() {
        let poller = SamplePoller::new(
            Arc::new(HttpSampleSource::new(url)),
            Arc::clone(&tracker),
            Arc::clone(&status),
            config.poll_interval,
        );
        tokio::spawn(poller.run());
        tracing::info!("Sample poller started");
    } else {
        tracing::info!("No upstream status feed configured; accepting pushed samples only");
    }

    let app = api::create_router(AppState {
        store,
        tracker,
        status,
        reports,
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
