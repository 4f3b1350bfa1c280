//! Vector index: pluggable, trait-based store for history embeddings.
//!
//! Default: `ChromaIndex` (external Chroma server, see `chroma.rs`).
//! Local development: `MemoryIndex` (in-process, cosine similarity).
//!
//! `AppState` holds an `Arc<dyn VectorIndex>`, chosen at startup via `VECTOR_BACKEND`.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vector store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed vector store response: {0}")]
    Malformed(String),
}

/// The two history collections. Names are shared with existing Chroma data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Past posts, retrieved as style memories.
    Memory,
    /// Generated posts with the user's feedback appended.
    Feedback,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Memory => "user_memory",
            Collection::Feedback => "user_feedback",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One stored vector. `doc_id` points back at the relational row.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub user_id: Uuid,
    pub doc_id: Uuid,
}

/// A query hit. Higher `score` is more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub doc_id: String,
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces the record with the same id.
    async fn upsert(
        &self,
        collection: Collection,
        record: VectorRecord,
    ) -> Result<(), VectorError>;

    /// Nearest records owned by `user_id`, most similar first, at most `top_k`.
    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        user_id: Uuid,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorError>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryIndex
// ────────────────────────────────────────────────────────────────────────────

/// In-process index. Brute-force cosine similarity over the user's records.
#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<Collection, Vec<VectorRecord>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(
        &self,
        collection: Collection,
        record: VectorRecord,
    ) -> Result<(), VectorError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection).or_default();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        user_id: Uuid,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorError> {
        let collections = self.collections.read().await;
        let Some(records) = collections.get(&collection) else {
            return Ok(vec![]);
        };

        let mut scored: Vec<VectorMatch> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| VectorMatch {
                doc_id: r.doc_id.to_string(),
                score: cosine_similarity(embedding, &r.embedding),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Cosine similarity in [-1, 1]. Returns 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
