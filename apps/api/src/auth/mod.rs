//! Authentication: argon2 password hashes and HS256 session tokens carried in
//! an `HttpOnly` cookie.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod token;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("token signing failed: {0}")]
    TokenSigning(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// The authenticated caller, placed in request extensions by `require_auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}
