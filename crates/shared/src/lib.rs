pub mod error;
pub mod events;
pub mod modes;

pub use error::FixError;
pub use events::Notice;
pub use modes::EnhancementMode;

pub mod settings {
    use serde::{Deserialize, Deserializer, Serialize};

    /// Persisted user configuration (`~/.fixai/config.json`).
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Config {
        /// Outer `None`: key absent from the file. `Some(None)`: explicit `null`.
        #[serde(
            default,
            deserialize_with = "deserialize_present",
            skip_serializing_if = "Option::is_none"
        )]
        api_key: Option<Option<String>>,
        /// Keys this version does not understand, written back untouched.
        #[serde(flatten)]
        pub extra: serde_json::Map<String, serde_json::Value>,
    }

    impl Config {
        /// The API key, if one is set and non-blank.
        pub fn api_key(&self) -> Option<&str> {
            self.api_key
                .as_ref()
                .and_then(|key| key.as_deref())
                .filter(|key| !key.trim().is_empty())
        }

        pub fn set_api_key(&mut self, key: Option<String>) {
            self.api_key = key.filter(|k| !k.trim().is_empty()).map(Some);
        }
    }

    /// Runs only when the key is present, so `null` stays distinct from absent.
    fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn system(content: impl Into<String>) -> Self {
            Self {
                role: "system".into(),
                content: content.into(),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: "user".into(),
                content: content.into(),
            }
        }
    }

    /// A single non-streaming completion call.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ChatRequest {
        pub model: String, // e.g., "gpt-4o-mini"
        pub messages: Vec<ChatMessage>,
        pub temperature: f32,
    }

    impl ChatRequest {
        /// Content of the first system message, if any.
        pub fn system_prompt(&self) -> Option<&str> {
            self.messages
                .iter()
                .find(|m| m.role == "system")
                .map(|m| m.content.as_str())
        }

        /// Content of the last user message, if any.
        pub fn user_content(&self) -> Option<&str> {
            self.messages
                .iter()
                .rev()
                .find(|m| m.role == "user")
                .map(|m| m.content.as_str())
        }
    }
}
