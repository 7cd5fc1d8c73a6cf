//! User-facing outcome notifications.

use crate::error::FixError;

/// A terminal outcome shown to the user as a desktop notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Text was rewritten and pasted
    Enhanced { mode: String },
    /// API key was stored
    ApiKeySaved,
    ApiKeyMissing,
    NoTextSelected,
    /// Accessibility permission missing for keystroke automation
    PermissionDenied,
    /// Remote call, clipboard write or paste failed
    EnhancementFailed { message: String },
    /// Config could not be read or written
    ConfigUnreadable { message: String },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::Enhanced { .. } | Notice::ApiKeySaved => "Success",
            _ => "Error",
        }
    }

    pub fn subtitle(&self) -> String {
        match self {
            Notice::Enhanced { mode } => format!("Text Enhanced ({})", mode),
            Notice::ApiKeySaved => "API Key Saved".to_string(),
            Notice::ApiKeyMissing => "API Key Required".to_string(),
            Notice::NoTextSelected => "No Text Selected".to_string(),
            Notice::PermissionDenied => "Accessibility Permission Required".to_string(),
            Notice::EnhancementFailed { .. } => "Enhancement Failed".to_string(),
            Notice::ConfigUnreadable { .. } => "Config Unreadable".to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::Enhanced { .. } => "The enhanced text has been pasted".to_string(),
            Notice::ApiKeySaved => "Your OpenAI API key has been saved".to_string(),
            Notice::ApiKeyMissing => FixError::ApiKeyMissing.to_string(),
            Notice::NoTextSelected => FixError::NoTextSelected.to_string(),
            Notice::PermissionDenied => {
                "Allow Fix AI in System Settings > Privacy & Security > Accessibility".to_string()
            }
            Notice::EnhancementFailed { message } | Notice::ConfigUnreadable { message } => {
                message.clone()
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.title() == "Error"
    }
}

impl From<&FixError> for Notice {
    fn from(err: &FixError) -> Self {
        match err {
            FixError::ApiKeyMissing => Notice::ApiKeyMissing,
            FixError::NoTextSelected => Notice::NoTextSelected,
            FixError::PermissionDenied => Notice::PermissionDenied,
            FixError::ConfigCorrupt { .. } | FixError::ConfigIo { .. } => {
                Notice::ConfigUnreadable {
                    message: err.to_string(),
                }
            }
            other => Notice::EnhancementFailed {
                message: other.to_string(),
            },
        }
    }
}
