use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::middleware::SESSION_COOKIE;
use super::password::{hash_password, verify_password};
use super::token::{issue_token, SESSION_DAYS};
use super::AuthUser;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
}

/// POST /api/register
pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<()>>), AppError> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(req.name),
        non_blank(req.email),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation("All fields are required".to_string()));
    };
    let email = normalize_email(&email);

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already in use".to_string()));
    }

    let password_hash = hash_off_executor(password).await?;
    let user_id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
        .bind(user_id)
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration for the same email.
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email already in use".to_string())
            }
            other => AppError::Database(other),
        })?;

    info!("Registered user {user_id}");

    let token = issue_token(user_id, &state.config.jwt_secret)?;
    let jar = jar.add(session_cookie(token, state.config.is_production()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(ApiResponse::message("User created successfully")),
    ))
}

/// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<()>>), AppError> {
    let (Some(email), Some(password)) = (
        non_blank(req.email),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    };
    let email = normalize_email(&email);

    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_off_executor(password, user.password_hash).await? {
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    let token = issue_token(user.id, &state.config.jwt_secret)?;
    let jar = jar.add(session_cookie(token, state.config.is_production()));

    info!("User {} logged in", user.id);
    Ok((jar, Json(ApiResponse::message("Login successful"))))
}

/// POST /api/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    // Always emitted, whether or not the request carried a session.
    let jar = jar.add(removal_cookie(state.config.is_production()));
    (jar, Json(ApiResponse::message("Logout successful")))
}

/// GET /api/userInfo
pub async fn handle_user_info(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserInfo>>, AppError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::data_only(UserInfo {
        name: row.name,
        email: row.email,
    })))
}

/// argon2 is CPU-bound; run it on the blocking pool, not the async executor.
async fn hash_off_executor(password: String) -> Result<String, AppError> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in hashing: {e}"))
        })?;
    Ok(hash?)
}

async fn verify_off_executor(password: String, stored_hash: String) -> Result<bool, AppError> {
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in verification: {e}"))
        })?;
    Ok(matches?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Session cookie. Cross-site (`SameSite=None; Secure`) in production so a
/// separately hosted frontend can send it; strict otherwise.
pub fn session_cookie(token: String, production: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(production)
        .same_site(same_site(production))
        .max_age(time::Duration::days(SESSION_DAYS))
        .build()
}

/// Expired, empty session cookie.
fn removal_cookie(production: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(production)
        .same_site(same_site(production))
        .max_age(time::Duration::ZERO)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .build()
}

fn same_site(production: bool) -> SameSite {
    if production {
        SameSite::None
    } else {
        SameSite::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ".into())), Some("x".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_development_cookie_is_strict() {
        let cookie = session_cookie("tok".into(), false);
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(false);
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn test_hash_and_verify_run_off_executor() {
        let hash = hash_off_executor("s3cret-pass".into()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_off_executor("s3cret-pass".into(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_off_executor("wrong".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_off_executor_rejects_unreadable_hash() {
        let result = verify_off_executor("pw".into(), "not-a-phc-string".into()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_production_cookie_is_cross_site_secure() {
        let cookie = session_cookie("tok".into(), true);
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));
    }
}
