//! Notifications and dialogs shown through AppleScript.

use anyhow::{anyhow, Context, Result};
use shared::Notice;
use std::process::Command;
use zeroize::Zeroizing;

const ABOUT_TITLE: &str = "Fix AI";
const ABOUT_MESSAGE: &str = "Select text and use the menu items to improve your writing using OpenAI. \
     \n\nMade with ❤️ by Adjie Purbojati";

/// Desktop notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Modal dialogs. Both calls block until the user answers.
pub trait Dialogs: Send + Sync {
    /// Ask for the API key, pre-filled with `current`. `None` on Cancel.
    fn prompt_api_key(&self, current: &str) -> Result<Option<Zeroizing<String>>>;

    fn show_about(&self) -> Result<()>;
}

/// Escape text for use inside an AppleScript string literal.
fn escape_applescript_string(text: &str) -> String {
    text.replace('\\', "\\\\") // Backslash must be first
        .replace('"', "\\\"")
        .replace('\r', "")
}

/// Extract the entered text from `display dialog` output.
fn parse_dialog_answer(stdout: &str) -> Option<String> {
    let (_, answer) = stdout.split_once("text returned:")?;
    Some(answer.trim_end_matches(['\r', '\n']).to_string())
}

fn is_user_cancel(stderr: &str) -> bool {
    stderr.contains("(-128)") || stderr.contains("User canceled")
}

fn about_script() -> String {
    format!(
        "display alert \"{}\" message \"{}\"",
        escape_applescript_string(ABOUT_TITLE),
        escape_applescript_string(ABOUT_MESSAGE)
    )
}

fn run_osascript(script: &str) -> Result<std::process::Output> {
    Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .context("failed to run osascript")
}

/// macOS desktop surfaces via `osascript`.
pub struct OsaDesktop;

impl Notifier for OsaDesktop {
    fn notify(&self, notice: &Notice) {
        if notice.is_error() {
            tracing::warn!(subtitle = %notice.subtitle(), "{}", notice.message());
        } else {
            tracing::info!(subtitle = %notice.subtitle(), "{}", notice.message());
        }
        let script = format!(
            "display notification \"{}\" with title \"{}\" subtitle \"{}\"",
            escape_applescript_string(&notice.message()),
            escape_applescript_string(notice.title()),
            escape_applescript_string(&notice.subtitle()),
        );
        match run_osascript(&script) {
            Ok(output) if !output.status.success() => {
                tracing::warn!(
                    "notification failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("notification failed: {:#}", e),
        }
    }
}

impl Dialogs for OsaDesktop {
    fn prompt_api_key(&self, current: &str) -> Result<Option<Zeroizing<String>>> {
        let script = format!(
            "display dialog \"Enter your OpenAI API key:\" default answer \"{}\" \
             with title \"API Key Setup\" buttons {{\"Cancel\", \"Save\"}} \
             default button \"Save\" cancel button \"Cancel\"",
            escape_applescript_string(current)
        );
        let output = run_osascript(&script)?;
        let stdout = Zeroizing::new(String::from_utf8_lossy(&output.stdout).into_owned());
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_user_cancel(&stderr) {
                return Ok(None);
            }
            return Err(anyhow!("API key dialog failed: {}", stderr.trim()));
        }
        parse_dialog_answer(&stdout)
            .map(|answer| Some(Zeroizing::new(answer)))
            .ok_or_else(|| anyhow!("API key dialog returned no text"))
    }

    fn show_about(&self) -> Result<()> {
        let output = run_osascript(&about_script())?;
        if !output.status.success() {
            return Err(anyhow!(
                "about dialog failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(())
    }
}
