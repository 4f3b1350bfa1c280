use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";
const DEFAULT_CHROMA_TENANT: &str = "default_tenant";
const DEFAULT_CHROMA_DATABASE: &str = "default_database";

/// Which vector index backs memory and feedback retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Chroma,
    /// In-process index. History is lost on restart.
    Memory,
}

impl FromStr for VectorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chroma" => Ok(VectorBackend::Chroma),
            "memory" => Ok(VectorBackend::Memory),
            other => bail!("Unknown VECTOR_BACKEND '{other}' (expected 'chroma' or 'memory')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub vector_backend: VectorBackend,
    pub chroma_url: String,
    pub chroma_tenant: String,
    pub chroma_database: String,
    pub retrieval_top_k: usize,
    pub cors_origin: Option<String>,
    pub app_env: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            vector_backend: optional_env("VECTOR_BACKEND")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(VectorBackend::Chroma),
            chroma_url: optional_env("CHROMA_URL")
                .unwrap_or_else(|| DEFAULT_CHROMA_URL.to_string()),
            chroma_tenant: optional_env("CHROMA_TENANT")
                .unwrap_or_else(|| DEFAULT_CHROMA_TENANT.to_string()),
            chroma_database: optional_env("CHROMA_DATABASE")
                .unwrap_or_else(|| DEFAULT_CHROMA_DATABASE.to_string()),
            retrieval_top_k: optional_env("RETRIEVAL_TOP_K")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("RETRIEVAL_TOP_K must be a non-negative integer")?
                .unwrap_or(3),
            cors_origin: optional_env("CORS_ORIGIN"),
            app_env: optional_env("APP_ENV").unwrap_or_else(|| "development".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Production turns on `Secure` + `SameSite=None` session cookies.
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
