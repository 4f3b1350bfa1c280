//! LinkedIn post generation: orchestrates the generation pipeline.
//!
//! Flow: validate ids → load past + liked post → load form → retrieve history
//!       → assemble prompt → chat completion → raw post text.
//!
//! The draft is returned to the caller, not persisted. It is only stored once
//! the user reviews it via `POST /api/generate-post`.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::prompts::{
    DEFAULT_CTA, DEFAULT_HASHTAGS, GHOSTWRITER_SYSTEM, LINKEDIN_PROMPT_TEMPLATE, NOT_PROVIDED,
    NO_FEEDBACKS, NO_LIKED_POST, NO_MEMORIES, NO_PAST_POST,
};
use crate::memory::retrieval::retrieve_context;
use crate::models::form::FormRow;
use crate::posts::store;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for post generation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePostRequest {
    pub form_id: Option<String>,
    pub past_post_id: Option<String>,
    pub liked_post_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GenerationIds {
    form_id: Uuid,
    past_post_id: Uuid,
    liked_post_id: Uuid,
}

/// Everything the prompt is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub form: &'a FormRow,
    pub past_post: Option<&'a str>,
    pub liked_post: Option<&'a str>,
    pub memories: &'a [String],
    pub feedbacks: &'a [String],
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Generates a LinkedIn post for `user_id` and returns the model's raw text.
///
/// Steps:
/// 1. validate formId / pastPostId / likedPostId
/// 2. load the past post and liked post (owned by the user)
/// 3. load the form (owned by the user)
/// 4. retrieve similar memories and feedback
/// 5. build the prompt and call the chat model
pub async fn generate_post(
    state: &AppState,
    user_id: Uuid,
    request: GeneratePostRequest,
) -> Result<String, AppError> {
    // Step 1: Validate ids
    let ids = parse_generation_ids(&request)?;

    // Step 2: Past + liked post
    let past_post = store::find_past_post(&state.db, user_id, ids.past_post_id).await?;
    let liked_post = store::find_liked_post(&state.db, user_id, ids.liked_post_id).await?;
    let (Some(past_post), Some(liked_post)) = (past_post, liked_post) else {
        return Err(AppError::NotFound("Post not found".to_string()));
    };

    // Step 3: Form
    let form = store::find_form(&state.db, user_id, ids.form_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".to_string()))?;

    // Step 4: Retrieval
    let context = retrieve_context(
        &state.db,
        state.embedder.as_ref(),
        state.vector_index.as_ref(),
        user_id,
        &form,
        state.config.retrieval_top_k,
    )
    .await?;

    // Step 5: Prompt + completion
    let prompt = build_linkedin_prompt(PromptInputs {
        form: &form,
        past_post: Some(past_post.past_post.as_str()),
        liked_post: Some(liked_post.liked_post.as_str()),
        memories: &context.memories,
        feedbacks: &context.feedbacks,
    });

    info!(
        "Generating post for form {} ({} memories, {} feedbacks)",
        form.id,
        context.memories.len(),
        context.feedbacks.len()
    );
    let post = state
        .llm
        .complete(&prompt, GHOSTWRITER_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to generate post: {e}")))?;

    info!("Generated post for form {} ({} chars)", form.id, post.len());
    Ok(post)
}

fn parse_generation_ids(request: &GeneratePostRequest) -> Result<GenerationIds, AppError> {
    let present = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let (Some(form_id), Some(past_post_id), Some(liked_post_id)) = (
        present(&request.form_id),
        present(&request.past_post_id),
        present(&request.liked_post_id),
    ) else {
        return Err(AppError::Validation(
            "Form ID, Past Post ID, and Liked Post ID are required".to_string(),
        ));
    };

    let parse = |raw: &str, what: &str| {
        Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid {what} format")))
    };
    Ok(GenerationIds {
        form_id: parse(&form_id, "Form ID")?,
        past_post_id: parse(&past_post_id, "Past Post ID")?,
        liked_post_id: parse(&liked_post_id, "Liked Post ID")?,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt assembly
// ────────────────────────────────────────────────────────────────────────────

/// Fills [`LINKEDIN_PROMPT_TEMPLATE`], substituting fallbacks for anything missing.
pub fn build_linkedin_prompt(inputs: PromptInputs<'_>) -> String {
    let form = inputs.form;
    let memories = numbered(inputs.memories, "Entry", NO_MEMORIES);
    let feedbacks = numbered(inputs.feedbacks, "Feedback", NO_FEEDBACKS);

    fill_template(
        LINKEDIN_PROMPT_TEMPLATE,
        &[
            ("role", form.role.as_str()),
            ("past_post", or_default(inputs.past_post, NO_PAST_POST)),
            ("memories", memories.as_str()),
            ("feedbacks", feedbacks.as_str()),
            ("updatetype", form.updatetype.as_str()),
            ("content", form.content.as_str()),
            ("challenges", or_default(form.challenges.as_deref(), NOT_PROVIDED)),
            ("tag", or_default(form.tag.as_deref(), NOT_PROVIDED)),
            ("links", or_default(form.links.as_deref(), NOT_PROVIDED)),
            ("other", or_default(form.other.as_deref(), NOT_PROVIDED)),
            ("cta", or_default(form.cta.as_deref(), DEFAULT_CTA)),
            ("liked_post", or_default(inputs.liked_post, NO_LIKED_POST)),
            ("hashtags", or_default(form.hashtags.as_deref(), DEFAULT_HASHTAGS)),
        ],
    )
    .trim()
    .to_string()
}

fn or_default<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

fn numbered(items: &[String], label: &str, empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{label} {}: {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-pass `{key}` substitution. Substituted values are never rescanned,
/// so user text containing braces is copied through untouched.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let hit = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, end))
        });
        match hit {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn form() -> FormRow {
        FormRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: "Staff Engineer".into(),
            updatetype: "Launch".into(),
            content: "Open-sourced our job scheduler".into(),
            challenges: None,
            tag: Some("@maria".into()),
            links: None,
            cta: None,
            hashtags: None,
            other: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(form: &str, past: &str, liked: &str) -> GeneratePostRequest {
        GeneratePostRequest {
            form_id: Some(form.into()),
            past_post_id: Some(past.into()),
            liked_post_id: Some(liked.into()),
        }
    }

    #[test]
    fn test_prompt_uses_fallbacks_when_history_is_empty() {
        let form = form();
        let prompt = build_linkedin_prompt(PromptInputs {
            form: &form,
            past_post: None,
            liked_post: None,
            memories: &[],
            feedbacks: &[],
        });

        assert!(prompt.starts_with("# ROLE\nYou are a world-class LinkedIn Ghostwriter."));
        assert!(prompt.contains("write a post for a Staff Engineer that sounds"));
        assert!(prompt.contains("- Recent Example: \"No recent example provided\""));
        assert!(prompt.contains("No historical memories available"));
        assert!(prompt.contains("No feedbacks available"));
        assert!(prompt.contains("- Specific Challenges: None"));
        assert!(prompt.contains("- People to Mention/Tag: @maria"));
        assert!(prompt.contains("- Call to Action: Invite engagement in comments"));
        assert!(prompt.contains("- Structure to Mimic: \"No structure template provided\""));
        assert!(prompt.contains("- HASHTAGS: Include these: 2-3 relevant tags."));
        assert!(prompt.ends_with("written by the user themselves."));
    }

    #[test]
    fn test_prompt_numbers_memories_and_feedbacks() {
        let form = form();
        let memories = vec!["First post".to_string(), "Second post".to_string()];
        let feedbacks = vec!["Fewer emojis".to_string()];
        let prompt = build_linkedin_prompt(PromptInputs {
            form: &form,
            past_post: Some("Last week we hired"),
            liked_post: Some("Hook. List. Question."),
            memories: &memories,
            feedbacks: &feedbacks,
        });

        assert!(prompt.contains("Entry 1: First post\nEntry 2: Second post"));
        assert!(prompt
            .contains("-user past feedbacks on generated posts:\nFeedback 1: Fewer emojis"));
        assert!(prompt.contains("- Recent Example: \"Last week we hired\""));
        assert!(prompt.contains("- Structure to Mimic: \"Hook. List. Question.\""));
        assert!(!prompt.contains("No historical memories available"));
    }

    #[test]
    fn test_prompt_section_order() {
        let form = form();
        let prompt = build_linkedin_prompt(PromptInputs {
            form: &form,
            past_post: None,
            liked_post: None,
            memories: &[],
            feedbacks: &[],
        });
        let positions: Vec<usize> = [
            "# ROLE",
            "# 1. USER'S WRITING DNA",
            "# 2. CURRENT MISSION",
            "# 3. STRUCTURAL TEMPLATE",
            "# 4. WRITING CONSTRAINTS",
            "# FINAL TASK",
        ]
        .iter()
        .map(|h| prompt.find(h).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_user_text_with_placeholders_is_not_expanded() {
        let mut form = form();
        form.content = "Templates like {hashtags} and {role}".into();
        form.hashtags = Some("#rust".into());
        let prompt = build_linkedin_prompt(PromptInputs {
            form: &form,
            past_post: None,
            liked_post: None,
            memories: &[],
            feedbacks: &[],
        });
        assert!(prompt.contains("- Topic: Templates like {hashtags} and {role}"));
        assert!(prompt.contains("Include these: #rust."));
    }

    #[test]
    fn test_blank_optional_fields_fall_back() {
        let mut form = form();
        form.cta = Some("   ".into());
        let prompt = build_linkedin_prompt(PromptInputs {
            form: &form,
            past_post: Some(""),
            liked_post: None,
            memories: &[],
            feedbacks: &[],
        });
        assert!(prompt.contains("- Call to Action: Invite engagement in comments"));
        assert!(prompt.contains("No recent example provided"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        assert_eq!(fill_template("a {x} {y} {", &[("x", "1")]), "a 1 {y} {");
    }

    #[test]
    fn test_parse_generation_ids_requires_all_three() {
        let id = Uuid::new_v4().to_string();
        let mut req = request(&id, &id, &id);
        req.liked_post_id = None;
        match parse_generation_ids(&req) {
            Err(AppError::Validation(msg)) => {
                assert_eq!(msg, "Form ID, Past Post ID, and Liked Post ID are required")
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert!(matches!(
            parse_generation_ids(&request(&id, "  ", &id)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_generation_ids_rejects_malformed() {
        let id = Uuid::new_v4().to_string();
        match parse_generation_ids(&request(&id, "not-a-uuid", &id)) {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Invalid Past Post ID format"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_generation_ids_ok() {
        let (f, p, l) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ids =
            parse_generation_ids(&request(&f.to_string(), &p.to_string(), &l.to_string())).unwrap();
        assert_eq!(
            ids,
            GenerationIds {
                form_id: f,
                past_post_id: p,
                liked_post_id: l,
            }
        );
    }
}
