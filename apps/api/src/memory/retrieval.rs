//! Retrieval: finds the history most similar to a form and loads it.
//!
//! Flow: form → query text → one embedding → top-k per collection (user-scoped)
//!       → doc ids → past posts / feedback rows, in similarity order.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::embedder::Embedder;
use super::index::{Collection, VectorIndex, VectorMatch};
use crate::errors::AppError;
use crate::models::form::FormRow;
use crate::models::post::{GeneratedPostRow, PastPostRow};

/// Doc ids returned by the vector index, nearest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryMatches {
    pub memory_ids: Vec<Uuid>,
    pub feedback_ids: Vec<Uuid>,
}

/// History text ready to be placed in a generation prompt.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    pub memories: Vec<String>,
    pub feedbacks: Vec<String>,
}

/// The text embedded to search history for a form.
pub fn build_form_query_text(form: &FormRow) -> String {
    format!(
        "Role: {}\nUpdate Type: {}\nMain Content: {}\nChallenges: {}\nCall To Action: {}",
        form.role,
        form.updatetype,
        form.content,
        form.challenges.as_deref().unwrap_or(""),
        form.cta.as_deref().unwrap_or(""),
    )
    .trim()
    .to_string()
}

/// Embeds `query_text` once and searches both history collections for `user_id`.
pub async fn search_history(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    user_id: Uuid,
    query_text: &str,
    top_k: usize,
) -> Result<HistoryMatches, AppError> {
    if top_k == 0 {
        return Ok(HistoryMatches::default());
    }

    let embedding = embedder
        .embed(query_text)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to generate embedding: {e}")))?;

    let memories = index
        .query(Collection::Memory, &embedding, user_id, top_k)
        .await?;
    let feedbacks = index
        .query(Collection::Feedback, &embedding, user_id, top_k)
        .await?;

    debug!(
        "History search via {}: {} memories (best {:?}), {} feedbacks (best {:?})",
        index.backend(),
        memories.len(),
        best_score(&memories),
        feedbacks.len(),
        best_score(&feedbacks)
    );

    Ok(HistoryMatches {
        memory_ids: parse_doc_ids(&memories),
        feedback_ids: parse_doc_ids(&feedbacks),
    })
}

/// Runs the full retrieval pipeline for `form` and loads the matched rows.
pub async fn retrieve_context(
    pool: &PgPool,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    user_id: Uuid,
    form: &FormRow,
    top_k: usize,
) -> Result<RetrievedContext, AppError> {
    let query_text = build_form_query_text(form);
    let matches = search_history(embedder, index, user_id, &query_text, top_k).await?;

    let memories = if matches.memory_ids.is_empty() {
        vec![]
    } else {
        let rows = sqlx::query_as::<_, PastPostRow>(
            "SELECT * FROM past_posts WHERE id = ANY($1) AND user_id = $2",
        )
        .bind(&matches.memory_ids)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        order_by_ids(&matches.memory_ids, rows, |r| r.id)
            .into_iter()
            .map(|r| r.past_post)
            .collect()
    };

    let feedbacks = if matches.feedback_ids.is_empty() {
        vec![]
    } else {
        let rows = sqlx::query_as::<_, GeneratedPostRow>(
            "SELECT * FROM generated_posts WHERE id = ANY($1) AND user_id = $2",
        )
        .bind(&matches.feedback_ids)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        order_by_ids(&matches.feedback_ids, rows, |r| r.id)
            .into_iter()
            .filter_map(|r| r.feedback)
            .filter(|f| !f.trim().is_empty())
            .collect()
    };

    info!(
        "Retrieved {} memories and {} feedbacks for form {}",
        memories.len(),
        feedbacks.len(),
        form.id
    );

    Ok(RetrievedContext {
        memories,
        feedbacks,
    })
}

fn best_score(matches: &[VectorMatch]) -> Option<f32> {
    matches.iter().map(|m| m.score).reduce(f32::max)
}

/// Doc ids that are not UUIDs cannot name a row and are dropped.
fn parse_doc_ids(matches: &[VectorMatch]) -> Vec<Uuid> {
    matches
        .iter()
        .filter_map(|m| Uuid::parse_str(&m.doc_id).ok())
        .collect()
}

/// Reorders `rows` to follow `ids`. Rows whose id is not in `ids` are dropped.
fn order_by_ids<T>(ids: &[Uuid], rows: Vec<T>, id_of: impl Fn(&T) -> Uuid) -> Vec<T> {
    let mut by_id: HashMap<Uuid, T> = rows.into_iter().map(|r| (id_of(&r), r)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
