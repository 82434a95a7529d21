//! Document Translator Service - Main Entry Point
//!
//! Chunked translation of structured documents over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doc_translator::api::{self, handlers::AppState};
use doc_translator::chunking::{ChunkPlanner, DocumentLinearizer, HeuristicTokenCounter};
use doc_translator::jobs::{JobProcessor, JobStore};
use doc_translator::output::HttpTranslator;
use doc_translator::types::ServiceConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "doc_translator=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ServiceConfig::from_env();
    config
        .chunk
        .validate()
        .context("invalid chunk configuration")?;

    let translator_url = config
        .translator_url
        .clone()
        .context("TRANSLATOR_URL must be set")?;

    info!("Starting Document Translator v{}", env!("CARGO_PKG_VERSION"));
    info!(
        target_tokens = config.chunk.target_chunk_tokens,
        max_tokens = config.chunk.max_chunk_tokens,
        translator = %translator_url,
        "Loaded configuration"
    );

    // Initialize components
    let linearizer = Arc::new(DocumentLinearizer::new());
    let planner = Arc::new(ChunkPlanner::new(
        Arc::new(HeuristicTokenCounter::new()),
        linearizer.clone(),
    ));
    let translator = Arc::new(HttpTranslator::new(&translator_url, linearizer)?);
    if !translator.health_check().await? {
        warn!(url = %translator_url, "Translation service is not reachable yet");
    }
    let processor = JobProcessor::new(planner, translator, config.max_concurrent_jobs);

    let job_store = Arc::new(RwLock::new(JobStore::new()));

    // Drop finished jobs periodically
    let cleanup_store = job_store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            cleanup_store.write().await.cleanup_old_jobs();
        }
    });

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        job_store,
        processor: Arc::new(processor),
    });

    // Build HTTP routes
    let app = api::router(state)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
