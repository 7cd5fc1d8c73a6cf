use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::{ChatMessage, ChatRequest};
use std::sync::LazyLock;
use std::time::Duration;

use crate::ChatBackend;

/// Upper bound on a single completion call, so a hung connection cannot
/// keep the busy indicator spinning forever.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first completion's text out of a response body.
fn first_completion(body: &str) -> Result<String> {
    let parsed: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| anyhow!("openai returned a malformed response: {}", e))?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("openai returned a malformed response: no completion text"))?;
    if text.trim().is_empty() {
        return Err(anyhow!("openai returned an empty completion"));
    }
    Ok(text)
}

// ── Client ───────────────────────────────────────────────────────────

pub struct OpenAIClient {
    http: Client,
    base_url: String,
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

impl OpenAIClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for OpenAIClient {
    fn id(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, auth_token: &str, request: ChatRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let req = OpenAIRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
        };
        tracing::debug!(model = %request.model, "sending chat completion");
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", auth_token))
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("openai request timed out after {}s", REQUEST_TIMEOUT.as_secs())
                } else {
                    anyhow!("could not reach openai: {}", e)
                }
            })?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let detail: String = body.chars().take(800).collect();
            if detail.trim().is_empty() {
                return Err(anyhow!("openai error: {}", status));
            }
            return Err(anyhow!("openai error: {}\n{}", status, detail));
        }
        first_completion(&body)
    }
}
