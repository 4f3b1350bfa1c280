use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::token::verify_token;
use super::{AuthError, AuthUser};
use crate::errors::AppError;
use crate::state::AppState;

/// Name of the session cookie set on login/register.
pub const SESSION_COOKIE: &str = "token";

/// Rejects requests without a valid session and exposes the caller as
/// `Extension<AuthUser>` to downstream handlers.
///
/// The `token` cookie is preferred; `Authorization: Bearer` is accepted for
/// non-browser clients.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, request.headers()).ok_or(AuthError::MissingToken)?;

    let claims = verify_token(&token, &state.config.jwt_secret).map_err(|e| {
        warn!(path = %request.uri().path(), "rejected session token: {e}");
        e
    })?;
    let user = AuthUser {
        id: claims.user_id()?,
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
