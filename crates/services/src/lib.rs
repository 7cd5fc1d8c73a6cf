pub mod clipboard;
pub mod config_store;
pub mod enhancement;

pub use clipboard::{Automation, ClipboardBridge, Gesture, GestureReport, Pasteboard};
pub use config_store::ConfigStore;
pub use enhancement::EnhancementEngine;
