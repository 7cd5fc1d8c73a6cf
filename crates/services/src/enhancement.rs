//! Rewrites text in one of the catalog's styles using a chat backend.

use providers::ChatBackend;
use shared::agent_api::{ChatMessage, ChatRequest};
use shared::{EnhancementMode, FixError};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature: enough variety to rephrase, low enough to keep meaning.
pub const TEMPERATURE: f32 = 0.7;

pub struct EnhancementEngine {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl EnhancementEngine {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn catalog(&self) -> &'static [EnhancementMode] {
        EnhancementMode::all()
    }

    /// Build the request for one rewrite.
    pub fn request_for(&self, mode: &EnhancementMode, input_text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(mode.system_prompt()),
                ChatMessage::user(input_text),
            ],
            temperature: TEMPERATURE,
        }
    }

    /// Rewrite `input_text` in the named style. One call, no retry, no cache.
    pub async fn enhance(
        &self,
        api_key: &str,
        mode_name: &str,
        input_text: &str,
    ) -> Result<String, FixError> {
        let mode = EnhancementMode::by_name(mode_name)
            .ok_or_else(|| FixError::UnknownMode(mode_name.to_string()))?;
        let request = self.request_for(mode, input_text);

        tracing::info!(mode = mode.name, backend = self.backend.id(), "enhancing text");
        self.backend
            .generate(api_key, request)
            .await
            .map_err(|e| {
                tracing::warn!(mode = mode.name, "enhancement failed: {:#}", e);
                FixError::Remote(format!("{:#}", e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(String, ChatRequest)>>,
        fail_with: Option<&'static str>,
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        fn id(&self) -> &'static str {
            "recording"
        }

        async fn generate(&self, auth_token: &str, request: ChatRequest) -> anyhow::Result<String> {
            self.calls.lock().push((auth_token.to_string(), request));
            match self.fail_with {
                Some(msg) => Err(anyhow!(msg)),
                None => Ok("Could you please send me the file?".to_string()),
            }
        }
    }

    #[tokio::test]
    async fn test_every_mode_sends_prefixed_instruction() {
        let backend = Arc::new(RecordingBackend::default());
        let engine = EnhancementEngine::new(backend.clone());

        for mode in engine.catalog() {
            engine.enhance("sk-test", mode.name, "some text").await.unwrap();
        }

        let calls = backend.calls.lock();
        assert_eq!(calls.len(), EnhancementMode::all().len());
        for ((key, request), mode) in calls.iter().zip(EnhancementMode::all()) {
            assert_eq!(key, "sk-test");
            assert_eq!(
                request.system_prompt().unwrap(),
                format!("You are a writing enhancement assistant. {}", mode.instruction)
            );
            assert_eq!(request.user_content(), Some("some text"));
            assert_eq!(request.model, "gpt-4o-mini");
            assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        }
    }

    #[tokio::test]
    async fn test_professional_scenario() {
        let backend = Arc::new(RecordingBackend::default());
        let engine = EnhancementEngine::new(backend.clone());

        let out = engine
            .enhance("sk-test", "Professional", "hey can u send me the file")
            .await
            .unwrap();
        assert_eq!(out, "Could you please send me the file?");

        let calls = backend.calls.lock();
        let request = &calls[0].1;
        assert_eq!(request.messages.len(), 2);
        assert!(request
            .system_prompt()
            .unwrap()
            .ends_with("Make the text more professional and formal while maintaining its core meaning."));
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_remote_error() {
        let backend = Arc::new(RecordingBackend {
            fail_with: Some("openai error: 401 Unauthorized"),
            ..Default::default()
        });
        let engine = EnhancementEngine::new(backend.clone());

        let err = engine.enhance("sk-bad", "Professional", "hi").await.unwrap_err();
        match err {
            FixError::Remote(message) => assert!(message.contains("401")),
            other => panic!("expected Remote, got {:?}", other),
        }
        // No retry
        assert_eq!(backend.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_mode_makes_no_call() {
        let backend = Arc::new(RecordingBackend::default());
        let engine = EnhancementEngine::new(backend.clone());

        let err = engine.enhance("sk-test", "Pirate", "hi").await.unwrap_err();
        assert!(matches!(err, FixError::UnknownMode(name) if name == "Pirate"));
        assert!(backend.calls.lock().is_empty());
    }
}
