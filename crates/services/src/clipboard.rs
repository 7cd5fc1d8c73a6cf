//! Selection capture and replacement through the system clipboard.
//!
//! The foreground application is arbitrary, so the only portable way to read
//! or replace its selection is to simulate Copy/Paste keystrokes and go
//! through the clipboard. The keystrokes need the macOS Accessibility grant;
//! when it is missing we open the matching System Settings pane.

use anyhow::{anyhow, Context, Result};
use shared::FixError;
use std::process::Command;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Time the OS needs to finish an asynchronous copy before the clipboard is read.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

static PERMISSION_DENIED_REGEX: OnceLock<regex::Regex> = OnceLock::new();

/// Keyboard shortcut sent to the foreground application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Copy,
    Paste,
}

impl Gesture {
    pub fn key(&self) -> char {
        match self {
            Gesture::Copy => 'c',
            Gesture::Paste => 'v',
        }
    }
}

/// What the automation layer reported after sending a gesture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureReport {
    pub success: bool,
    /// Diagnostic stream (stderr) of the automation command
    pub diagnostics: String,
}

impl GestureReport {
    pub fn ok() -> Self {
        Self {
            success: true,
            diagnostics: String::new(),
        }
    }

    pub fn failed(diagnostics: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostics: diagnostics.into(),
        }
    }
}

/// OS UI-automation facility.
pub trait Automation: Send + Sync {
    /// Send a gesture. `Err` means the automation could not run at all.
    fn send_gesture(&self, gesture: Gesture) -> Result<GestureReport>;

    /// Open the accessibility privacy settings for the user.
    fn open_accessibility_settings(&self) -> Result<()>;
}

/// System clipboard text access.
pub trait Pasteboard: Send + Sync {
    /// Current text contents, `None` when empty or not text.
    fn read_text(&self) -> Option<String>;

    fn write_text(&self, text: &str) -> Result<()>;
}

/// Does an automation diagnostic say the Accessibility grant is missing?
pub fn is_permission_denied(diagnostics: &str) -> bool {
    let re = PERMISSION_DENIED_REGEX.get_or_init(|| {
        regex::Regex::new(r"(?i)not allowed|assistive|\(-?1002\)|\b1002\b").unwrap()
    });
    re.is_match(diagnostics)
}

pub struct ClipboardBridge {
    automation: Box<dyn Automation>,
    pasteboard: Box<dyn Pasteboard>,
    settle: Duration,
}

impl ClipboardBridge {
    pub fn new(automation: Box<dyn Automation>, pasteboard: Box<dyn Pasteboard>) -> Self {
        Self {
            automation,
            pasteboard,
            settle: SETTLE_DELAY,
        }
    }

    /// The macOS bridge: `osascript` keystrokes and the `arboard` clipboard.
    pub fn system() -> Self {
        Self::new(Box::new(OsaAutomation), Box::new(SystemPasteboard))
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Copy the foreground selection and return it.
    ///
    /// Blocks for the settle delay.
    pub fn capture_selection(&self) -> Result<String, FixError> {
        self.gesture(Gesture::Copy)?;
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }

        match self.pasteboard.read_text() {
            Some(text) if !text.trim().is_empty() => {
                tracing::debug!(chars = text.chars().count(), "captured selection");
                Ok(text)
            }
            _ => Err(FixError::NoTextSelected),
        }
    }

    /// Put `text` on the clipboard and paste it over the selection.
    ///
    /// Whatever was on the clipboard before is lost.
    pub fn replace_selection(&self, text: &str) -> Result<(), FixError> {
        self.pasteboard
            .write_text(text)
            .map_err(|e| FixError::Clipboard(format!("{:#}", e)))?;
        self.gesture(Gesture::Paste)
    }

    fn gesture(&self, gesture: Gesture) -> Result<(), FixError> {
        let report = self
            .automation
            .send_gesture(gesture)
            .map_err(|e| FixError::Automation(format!("{:#}", e)))?;

        if is_permission_denied(&report.diagnostics) {
            tracing::warn!(?gesture, "accessibility permission denied: {}", report.diagnostics.trim());
            if let Err(e) = self.automation.open_accessibility_settings() {
                tracing::warn!("could not open accessibility settings: {:#}", e);
            }
            return Err(FixError::PermissionDenied);
        }
        if !report.success {
            // Keystroke delivery is best-effort; the clipboard read decides.
            tracing::warn!(?gesture, "automation reported failure: {}", report.diagnostics.trim());
        }
        Ok(())
    }
}

// ── macOS implementations ────────────────────────────────────────────

/// Keystrokes through `System Events` via `osascript`.
pub struct OsaAutomation;

impl Automation for OsaAutomation {
    fn send_gesture(&self, gesture: Gesture) -> Result<GestureReport> {
        let script = format!(
            "tell application \"System Events\" to keystroke \"{}\" using command down",
            gesture.key()
        );
        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .context("failed to run osascript")?;
        Ok(GestureReport {
            success: output.status.success(),
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn open_accessibility_settings(&self) -> Result<()> {
        open::that(ACCESSIBILITY_SETTINGS_URL)
            .with_context(|| format!("failed to open {}", ACCESSIBILITY_SETTINGS_URL))
    }
}

/// `arboard` clipboard; a fresh handle per call.
pub struct SystemPasteboard;

impl Pasteboard for SystemPasteboard {
    fn read_text(&self) -> Option<String> {
        let mut clipboard = arboard::Clipboard::new().ok()?;
        clipboard.get_text().ok()
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| anyhow!("could not write clipboard: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeDesktop {
        clipboard: Mutex<Option<String>>,
        /// Text the foreground app has selected; Copy moves it to the clipboard.
        selection: Mutex<Option<String>>,
        deny: bool,
        gestures: Mutex<Vec<Gesture>>,
        settings_opened: Mutex<usize>,
    }

    struct FakeAutomation(Arc<FakeDesktop>);
    struct FakePasteboard(Arc<FakeDesktop>);

    impl Automation for FakeAutomation {
        fn send_gesture(&self, gesture: Gesture) -> Result<GestureReport> {
            self.0.gestures.lock().push(gesture);
            if self.0.deny {
                return Ok(GestureReport::failed(
                    "execution error: osascript is not allowed to send keystrokes. (1002)",
                ));
            }
            if gesture == Gesture::Copy {
                if let Some(selected) = self.0.selection.lock().clone() {
                    *self.0.clipboard.lock() = Some(selected);
                }
            }
            Ok(GestureReport::ok())
        }

        fn open_accessibility_settings(&self) -> Result<()> {
            *self.0.settings_opened.lock() += 1;
            Ok(())
        }
    }

    impl Pasteboard for FakePasteboard {
        fn read_text(&self) -> Option<String> {
            self.0.clipboard.lock().clone()
        }

        fn write_text(&self, text: &str) -> Result<()> {
            *self.0.clipboard.lock() = Some(text.to_string());
            Ok(())
        }
    }

    fn bridge(desktop: &Arc<FakeDesktop>) -> ClipboardBridge {
        ClipboardBridge::new(
            Box::new(FakeAutomation(desktop.clone())),
            Box::new(FakePasteboard(desktop.clone())),
        )
        .with_settle_delay(Duration::ZERO)
    }

    #[test]
    fn test_capture_returns_selection() {
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.selection.lock() = Some("hey can u send me the file".into());

        let text = bridge(&desktop).capture_selection().unwrap();
        assert_eq!(text, "hey can u send me the file");
        assert_eq!(*desktop.gestures.lock(), vec![Gesture::Copy]);
    }

    #[test]
    fn test_capture_empty_clipboard() {
        let desktop = Arc::new(FakeDesktop::default());
        assert!(matches!(
            bridge(&desktop).capture_selection(),
            Err(FixError::NoTextSelected)
        ));

        *desktop.clipboard.lock() = Some("  \n".into());
        assert!(matches!(
            bridge(&desktop).capture_selection(),
            Err(FixError::NoTextSelected)
        ));
    }

    #[test]
    fn test_capture_then_replace_leaves_replacement_on_clipboard() {
        let desktop = Arc::new(FakeDesktop::default());
        *desktop.clipboard.lock() = Some("something older".into());
        *desktop.selection.lock() = Some("draft".into());

        let bridge = bridge(&desktop);
        bridge.capture_selection().unwrap();
        bridge.replace_selection("final").unwrap();

        assert_eq!(desktop.clipboard.lock().as_deref(), Some("final"));
        assert_eq!(*desktop.gestures.lock(), vec![Gesture::Copy, Gesture::Paste]);
    }

    #[test]
    fn test_permission_denied_opens_settings_once() {
        let desktop = Arc::new(FakeDesktop {
            deny: true,
            ..Default::default()
        });

        assert!(matches!(
            bridge(&desktop).capture_selection(),
            Err(FixError::PermissionDenied)
        ));
        assert_eq!(*desktop.settings_opened.lock(), 1);
    }

    #[test]
    fn test_replace_permission_denied() {
        let desktop = Arc::new(FakeDesktop {
            deny: true,
            ..Default::default()
        });

        assert!(matches!(
            bridge(&desktop).replace_selection("x"),
            Err(FixError::PermissionDenied)
        ));
        assert_eq!(*desktop.settings_opened.lock(), 1);
    }

    #[test]
    fn test_permission_patterns() {
        assert!(is_permission_denied(
            "osascript is not allowed to send keystrokes. (1002)"
        ));
        assert!(is_permission_denied(
            "System Events got an error: osascript is not allowed assistive access. (-1719)"
        ));
        assert!(is_permission_denied("Not Allowed"));
        assert!(!is_permission_denied(""));
        assert!(!is_permission_denied("execution error: Can't get application (-1728)"));
    }
}
