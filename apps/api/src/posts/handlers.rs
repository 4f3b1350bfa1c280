//! Axum route handlers for form intake and post history.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::store::{self, NewForm};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::memory::capture::{feedback_document_text, spawn_index_document, IndexedDocument};
use crate::memory::index::Collection;
use crate::models::form::FormRow;
use crate::models::post::{GeneratedPostRow, LikedPostRow, PastPostRow};
use crate::response::ApiResponse;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Body of POST /api/save-form. Everything is optional at the serde layer so
/// missing fields produce a 400 with a readable message instead of a 422.
#[derive(Debug, Default, Deserialize)]
pub struct SaveFormRequest {
    pub role: Option<String>,
    pub updatetype: Option<String>,
    pub content: Option<String>,
    pub challenges: Option<String>,
    pub tag: Option<String>,
    pub links: Option<String>,
    #[serde(rename = "CTA")]
    pub cta: Option<String>,
    pub hashtags: Option<String>,
    pub other: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePastPostRequest {
    pub form_id: Option<String>,
    pub past_post: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLikedPostRequest {
    pub form_id: Option<String>,
    pub liked_post: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveGeneratedPostRequest {
    pub form_id: Option<String>,
    pub gen_post: Option<String>,
    pub liked: Option<bool>,
    pub feedback: Option<String>,
}

impl SaveFormRequest {
    /// Trims every field and checks the required ones, reporting all that are missing.
    pub fn validate(self) -> Result<NewForm, AppError> {
        let role = trimmed(self.role);
        let updatetype = trimmed(self.updatetype);
        let content = trimmed(self.content);

        let missing: Vec<&str> = [
            (role.is_none(), "Role is required"),
            (updatetype.is_none(), "Update type is required"),
            (content.is_none(), "Content is required"),
        ]
        .into_iter()
        .filter_map(|(absent, msg)| absent.then_some(msg))
        .collect();

        match (role, updatetype, content) {
            (Some(role), Some(updatetype), Some(content)) => Ok(NewForm {
                role,
                updatetype,
                content,
                challenges: trimmed(self.challenges),
                tag: trimmed(self.tag),
                links: trimmed(self.links),
                cta: trimmed(self.cta),
                hashtags: trimmed(self.hashtags),
                other: trimmed(self.other),
            }),
            _ => Err(AppError::Validation(missing.join(", "))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/save-form
pub async fn handle_save_form(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SaveFormRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FormRow>>), AppError> {
    let form = req.validate()?;
    let saved = store::insert_form(&state.db, user.id, &form).await?;

    tracing::info!("Saved form {} for user {}", saved.id, user.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data("Form entry created successfully", saved)),
    ))
}

/// POST /api/past-posts
///
/// Persists the post, then mirrors it into the memory collection in the background.
pub async fn handle_save_past_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SavePastPostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PastPostRow>>), AppError> {
    let (Some(raw_form_id), Some(past_post)) = (trimmed(req.form_id), trimmed(req.past_post))
    else {
        return Err(AppError::Validation(
            "Form ID and Post content are required".to_string(),
        ));
    };
    let form_id = parse_form_id(&raw_form_id)?;
    ensure_form_owned(&state, user.id, form_id).await?;

    let saved = store::insert_past_post(&state.db, user.id, form_id, &past_post).await?;

    spawn_index_document(
        state.embedder.clone(),
        state.vector_index.clone(),
        Collection::Memory,
        IndexedDocument {
            text: saved.past_post.clone(),
            user_id: user.id,
            doc_id: saved.id,
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data("Post added to history", saved)),
    ))
}

/// POST /api/liked-posts
pub async fn handle_save_liked_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SaveLikedPostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LikedPostRow>>), AppError> {
    let (Some(raw_form_id), Some(liked_post)) = (trimmed(req.form_id), trimmed(req.liked_post))
    else {
        return Err(AppError::Validation(
            "Form ID and Liked content are required".to_string(),
        ));
    };
    let form_id = parse_form_id(&raw_form_id)?;
    ensure_form_owned(&state, user.id, form_id).await?;

    let saved = store::insert_liked_post(&state.db, user.id, form_id, &liked_post).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data("Post saved to liked collection", saved)),
    ))
}

/// POST /api/generate-post
///
/// Stores a reviewed draft with the user's verdict. The draft plus feedback is
/// mirrored into the feedback collection so later generations can learn from it.
pub async fn handle_save_generated_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SaveGeneratedPostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GeneratedPostRow>>), AppError> {
    let form_id = parse_form_id(req.form_id.as_deref().unwrap_or_default())?;
    let gen_post = trimmed(req.gen_post)
        .ok_or_else(|| AppError::Validation("post content is required".to_string()))?;
    let liked = req
        .liked
        .ok_or_else(|| AppError::Validation("Liked status is required".to_string()))?;
    let feedback = trimmed(req.feedback);

    ensure_form_owned(&state, user.id, form_id).await?;

    let saved = store::insert_generated_post(
        &state.db,
        user.id,
        form_id,
        &gen_post,
        liked,
        feedback.as_deref(),
    )
    .await?;

    spawn_index_document(
        state.embedder.clone(),
        state.vector_index.clone(),
        Collection::Feedback,
        IndexedDocument {
            text: feedback_document_text(&saved.gen_post, saved.feedback.as_deref()),
            user_id: user.id,
            doc_id: saved.id,
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(
            "Generated post saved successfully",
            saved,
        )),
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_form_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation("Invalid Form ID format".to_string()))
}

async fn ensure_form_owned(
    state: &AppState,
    user_id: Uuid,
    form_id: Uuid,
) -> Result<(), AppError> {
    store::find_form(&state.db, user_id, form_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> SaveFormRequest {
        SaveFormRequest {
            role: Some("  Founder ".into()),
            updatetype: Some("Milestone".into()),
            content: Some("We hit 1k users".into()),
            challenges: Some("   ".into()),
            tag: None,
            links: Some("https://example.com ".into()),
            cta: Some("Sign up".into()),
            hashtags: Some("#startup".into()),
            other: None,
        }
    }

    #[test]
    fn test_validate_trims_and_blanks_become_none() {
        let form = full_request().validate().unwrap();
        assert_eq!(form.role, "Founder");
        assert_eq!(form.challenges, None);
        assert_eq!(form.links.as_deref(), Some("https://example.com"));
        assert_eq!(form.cta.as_deref(), Some("Sign up"));
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let req = SaveFormRequest {
            role: Some(" ".into()),
            ..Default::default()
        };
        match req.validate() {
            Err(AppError::Validation(msg)) => {
                assert_eq!(
                    msg,
                    "Role is required, Update type is required, Content is required"
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_save_form_request_reads_wire_field_names() {
        let req: SaveFormRequest = serde_json::from_value(serde_json::json!({
            "role": "PM",
            "updatetype": "Hiring",
            "content": "We're hiring",
            "CTA": "DM me"
        }))
        .unwrap();
        assert_eq!(req.cta.as_deref(), Some("DM me"));
        assert_eq!(req.updatetype.as_deref(), Some("Hiring"));
    }

    #[test]
    fn test_parse_form_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_form_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_form_id("65a1b2c3d4e5f6a7b8c9d0e1"),
            Err(AppError::Validation(_))
        ));
        assert!(parse_form_id("").is_err());
    }

    #[test]
    fn test_generated_post_request_camel_case() {
        let req: SaveGeneratedPostRequest = serde_json::from_value(serde_json::json!({
            "formId": "x",
            "genPost": "Draft",
            "liked": false
        }))
        .unwrap();
        assert_eq!(req.gen_post.as_deref(), Some("Draft"));
        assert_eq!(req.liked, Some(false));
        assert!(req.feedback.is_none());
    }
}
