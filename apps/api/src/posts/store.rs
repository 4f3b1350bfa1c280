//! SQL for forms and post history. Every lookup is scoped to the owning user.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::form::FormRow;
use crate::models::post::{GeneratedPostRow, LikedPostRow, PastPostRow};

/// A validated form ready to insert. Optional fields are `None` when blank.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForm {
    pub role: String,
    pub updatetype: String,
    pub content: String,
    pub challenges: Option<String>,
    pub tag: Option<String>,
    pub links: Option<String>,
    pub cta: Option<String>,
    pub hashtags: Option<String>,
    pub other: Option<String>,
}

pub async fn insert_form(pool: &PgPool, user_id: Uuid, form: &NewForm) -> sqlx::Result<FormRow> {
    sqlx::query_as::<_, FormRow>(
        r#"
        INSERT INTO forms
            (id, user_id, role, updatetype, content, challenges, tag, links, cta, hashtags, other)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&form.role)
    .bind(&form.updatetype)
    .bind(&form.content)
    .bind(&form.challenges)
    .bind(&form.tag)
    .bind(&form.links)
    .bind(&form.cta)
    .bind(&form.hashtags)
    .bind(&form.other)
    .fetch_one(pool)
    .await
}

pub async fn find_form(
    pool: &PgPool,
    user_id: Uuid,
    form_id: Uuid,
) -> sqlx::Result<Option<FormRow>> {
    sqlx::query_as::<_, FormRow>("SELECT * FROM forms WHERE id = $1 AND user_id = $2")
        .bind(form_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_past_post(
    pool: &PgPool,
    user_id: Uuid,
    form_id: Uuid,
    past_post: &str,
) -> sqlx::Result<PastPostRow> {
    sqlx::query_as::<_, PastPostRow>(
        "INSERT INTO past_posts (id, user_id, form_id, past_post) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(form_id)
    .bind(past_post)
    .fetch_one(pool)
    .await
}

pub async fn find_past_post(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<PastPostRow>> {
    sqlx::query_as::<_, PastPostRow>("SELECT * FROM past_posts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_liked_post(
    pool: &PgPool,
    user_id: Uuid,
    form_id: Uuid,
    liked_post: &str,
) -> sqlx::Result<LikedPostRow> {
    sqlx::query_as::<_, LikedPostRow>(
        "INSERT INTO liked_posts (id, user_id, form_id, liked_post) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(form_id)
    .bind(liked_post)
    .fetch_one(pool)
    .await
}

pub async fn find_liked_post(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<LikedPostRow>> {
    sqlx::query_as::<_, LikedPostRow>("SELECT * FROM liked_posts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_generated_post(
    pool: &PgPool,
    user_id: Uuid,
    form_id: Uuid,
    gen_post: &str,
    liked: bool,
    feedback: Option<&str>,
) -> sqlx::Result<GeneratedPostRow> {
    sqlx::query_as::<_, GeneratedPostRow>(
        r#"
        INSERT INTO generated_posts (id, user_id, form_id, gen_post, liked, feedback)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(form_id)
    .bind(gen_post)
    .bind(liked)
    .bind(feedback)
    .fetch_one(pool)
    .await
}
