//! Mirrors newly persisted history into the vector index.
//!
//! The relational row is the source of truth. Mirroring runs after the row is
//! committed and its failure never fails the request that triggered it.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::embedder::Embedder;
use super::index::{Collection, VectorIndex, VectorRecord};

/// A relational row to be embedded and indexed.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub text: String,
    pub user_id: Uuid,
    pub doc_id: Uuid,
}

/// Embeds `doc.text` and upserts it under `doc.doc_id`.
/// Returns `Ok(false)` without calling out when the text is blank.
pub async fn index_document(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    collection: Collection,
    doc: IndexedDocument,
) -> Result<bool> {
    if doc.text.trim().is_empty() {
        debug!("Skipping empty document {} for {}", doc.doc_id, collection);
        return Ok(false);
    }

    let embedding = embedder.embed(&doc.text).await?;
    index
        .upsert(
            collection,
            VectorRecord {
                id: doc.doc_id.to_string(),
                embedding,
                document: doc.text,
                user_id: doc.user_id,
                doc_id: doc.doc_id,
            },
        )
        .await?;

    info!("Saved {} to vector index {}", doc.doc_id, collection);
    Ok(true)
}

/// Fire-and-forget variant of [`index_document`] for request handlers.
pub fn spawn_index_document(
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: Collection,
    doc: IndexedDocument,
) {
    tokio::spawn(async move {
        let doc_id = doc.doc_id;
        if let Err(e) = index_document(embedder.as_ref(), index.as_ref(), collection, doc).await {
            warn!("Error saving {doc_id} to vector index {collection}: {e:#}");
        }
    });
}

/// Text stored in the feedback collection for a reviewed draft.
pub fn feedback_document_text(gen_post: &str, feedback: Option<&str>) -> String {
    format!("{}\nFeedback: {}", gen_post, feedback.unwrap_or(""))
}
