use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A post the user published before; used as a style reference and mirrored
/// into the memory collection.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PastPostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub form_id: Uuid,
    pub past_post: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Someone else's post whose structure the user wants to mimic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LikedPostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub form_id: Uuid,
    pub liked_post: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A draft the user reviewed, with their verdict and optional critique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub form_id: Uuid,
    pub gen_post: String,
    pub liked: bool,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
