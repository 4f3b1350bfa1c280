//! Axum route handlers for post generation.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::generation::generator::{generate_post, GeneratePostRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePostResponse {
    pub success: bool,
    pub generated_post: String,
}

/// POST /api/generate-linkedin-post
pub async fn handle_generate_linkedin_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<GeneratePostRequest>,
) -> Result<Json<GeneratePostResponse>, AppError> {
    let generated_post = generate_post(&state, user.id, request).await?;

    Ok(Json(GeneratePostResponse {
        success: true,
        generated_post,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let body = serde_json::to_value(GeneratePostResponse {
            success: true,
            generated_post: "Hello LinkedIn".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "generatedPost": "Hello LinkedIn"})
        );
    }
}
