/// LLM Client: the single point of entry for all OpenAI-compatible API calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion or embedding
/// endpoints directly. Generation and retrieval both go through this module.
///
/// Models are hardcoded so drafts and stored vectors stay comparable over time.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Chat model used for post generation.
pub const CHAT_MODEL: &str = "gpt-4o-mini";
/// Embedding model for both stored history and retrieval queries.
/// Changing it invalidates every vector already in the index.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
const TEMPERATURE: f32 = 0.7;
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Expected {expected} embeddings, got {got}")]
    EmbeddingCount { expected: usize, got: usize },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it carries any non-blank content.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingResponse {
    fn into_ordered(self) -> Vec<Vec<f32>> {
        let mut data = self.data;
        data.sort_by_key(|d| d.index);
        data.into_iter().map(|d| d.embedding).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Wraps the chat-completions and embeddings endpoints with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry_base_delay: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_base_delay: RETRY_BASE_DELAY,
        })
    }

    #[cfg(test)]
    fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one system + user message pair and returns the model's text.
    pub async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response: ChatResponse = self.post_with_retry("chat/completions", &request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    /// Embeds every text in one request. Output order matches input order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: texts,
        };
        let response: EmbeddingResponse = self.post_with_retry("embeddings", &request).await?;

        if let Some(usage) = &response.usage {
            debug!("Embedding tokens used: {}", usage.total_tokens);
        }

        let embeddings = response.into_ordered();
        if embeddings.len() != texts.len() {
            return Err(LlmError::EmbeddingCount {
                expected: texts.len(),
                got: embeddings.len(),
            });
        }
        Ok(embeddings)
    }

    /// POSTs `body` to `{base_url}/{path}`.
    /// Retries on 429, 5xx and transport errors with exponential backoff.
    async fn post_with_retry<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_base_delay, attempt);
                warn!(
                    "OpenAI call to {} attempt {} failed, retrying after {}ms...",
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("OpenAI API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: extract_error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: extract_error_message(body),
                });
            }

            let text = response.text().await?;
            return Ok(serde_json::from_str(&text)?);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Exponential backoff before retry `attempt` (1-based): base, 2×base, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1 << attempt.saturating_sub(1))
}

/// Pulls `error.message` out of an OpenAI error body, falling back to the raw body.
fn extract_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
