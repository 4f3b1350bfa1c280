use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};

/// Turns text into a vector. Carried in `AppState` as `Arc<dyn Embedder>` so
/// retrieval can be exercised without the network.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

#[async_trait]
impl Embedder for LlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyContent)
    }
}
