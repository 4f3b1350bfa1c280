use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted post-intent form. Field names on the wire match the web client
/// (`updatetype`, `CTA`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FormRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub updatetype: String,
    pub content: String,
    pub challenges: Option<String>,
    pub tag: Option<String>,
    pub links: Option<String>,
    #[serde(rename = "CTA")]
    pub cta: Option<String>,
    pub hashtags: Option<String>,
    pub other: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
