use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::memory::embedder::Embedder;
use crate::memory::index::VectorIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Embeds history and queries. `LlmClient` in production.
    pub embedder: Arc<dyn Embedder>,
    /// Chroma or in-process, per `VECTOR_BACKEND`.
    pub vector_index: Arc<dyn VectorIndex>,
    pub config: Config,
}
