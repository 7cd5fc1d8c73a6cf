//! Remote text-generation backends.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use shared::agent_api::ChatRequest;

pub use openai::OpenAIClient;

/// A service that turns a chat request into generated text.
///
/// Note: Uses async_trait for object safety
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Provider identifier
    fn id(&self) -> &'static str;

    /// Run one completion and return the first choice's text.
    async fn generate(&self, auth_token: &str, request: ChatRequest) -> Result<String>;
}
