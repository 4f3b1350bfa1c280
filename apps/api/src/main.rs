mod auth;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod memory;
mod models;
mod posts;
mod response;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, VectorBackend};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::memory::chroma::ChromaIndex;
use crate::memory::index::{MemoryIndex, VectorIndex};
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

    info!("Starting Ghostpost API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone(), config.openai_base_url.clone())?;
    info!(
        "LLM client initialized (chat: {}, embeddings: {}, base: {})",
        llm_client::CHAT_MODEL,
        llm_client::EMBEDDING_MODEL,
        llm.base_url()
    );

    // Initialize vector index
    let vector_index: Arc<dyn VectorIndex> = match config.vector_backend {
        VectorBackend::Chroma => Arc::new(ChromaIndex::new(
            &config.chroma_url,
            &config.chroma_tenant,
            &config.chroma_database,
        )?),
        VectorBackend::Memory => Arc::new(MemoryIndex::new()),
    };
    info!("Vector index initialized ({})", vector_index.backend());

    let cors = build_cors(&config)?;

    // Build app state
    let state = AppState {
        db,
        embedder: Arc::new(llm.clone()),
        llm,
        vector_index,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Credentialed CORS for a configured frontend origin; permissive otherwise.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    let Some(origin) = config.cors_origin.as_deref() else {
        return Ok(CorsLayer::permissive());
    };

    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("CORS_ORIGIN is not a valid origin: {origin}"))?;
    info!("CORS restricted to {:?}", origin);

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}
