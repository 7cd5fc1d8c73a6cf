//! Catalog of rewrite styles offered in the menu.

/// Prefix of every system prompt sent to the model.
pub const SYSTEM_PREFIX: &str = "You are a writing enhancement assistant. ";

/// A named rewrite style paired with its instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhancementMode {
    pub name: &'static str,
    pub instruction: &'static str,
}

const CATALOG: &[EnhancementMode] = &[
    EnhancementMode {
        name: "Professional",
        instruction: "Make the text more professional and formal while maintaining its core meaning.",
    },
    EnhancementMode {
        name: "Friendly with Emoji",
        instruction: "Make the text more friendly and casual, adding appropriate emojis while maintaining its core meaning.",
    },
];

impl EnhancementMode {
    /// All modes, in menu order.
    pub fn all() -> &'static [EnhancementMode] {
        CATALOG
    }

    pub fn by_name(name: &str) -> Option<&'static EnhancementMode> {
        CATALOG.iter().find(|mode| mode.name == name)
    }

    pub fn menu_label(&self) -> String {
        format!("Make {}", self.name)
    }

    pub fn system_prompt(&self) -> String {
        format!("{}{}", SYSTEM_PREFIX, self.instruction)
    }
}
