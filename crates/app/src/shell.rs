//! Top-level controller behind the menu actions.
//!
//! Actions run as tokio tasks off the UI thread. Only one enhancement may be
//! in flight; a second trigger while one is running is rejected with
//! [`FixError::Busy`] and makes no network call.

use crate::desktop::{Dialogs, Notifier};
use crate::status::StatusController;
use parking_lot::Mutex;
use services::{ClipboardBridge, ConfigStore, EnhancementEngine};
use shared::settings::Config;
use shared::{EnhancementMode, FixError, Notice};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct AppShell {
    config: Mutex<Config>,
    store: ConfigStore,
    clipboard: Arc<ClipboardBridge>,
    engine: EnhancementEngine,
    status: StatusController,
    notifier: Arc<dyn Notifier>,
    dialogs: Arc<dyn Dialogs>,
    in_flight: AtomicBool,
}

/// Held while an enhancement runs; clears the flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Run blocking OS work (keystrokes, clipboard, dialogs) off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, FixError>
where
    F: FnOnce() -> Result<T, FixError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FixError::Automation(format!("background task failed: {}", e)))?
}

/// Load the config at startup. An unreadable file is reported once and
/// treated as empty, so the user can set the key again.
pub fn load_initial_config(store: &ConfigStore, notifier: &dyn Notifier) -> Config {
    match store.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("starting with an empty config: {}", e);
            notifier.notify(&Notice::from(&e));
            Config::default()
        }
    }
}

impl AppShell {
    pub fn new(
        config: Config,
        store: ConfigStore,
        clipboard: Arc<ClipboardBridge>,
        engine: EnhancementEngine,
        status: StatusController,
        notifier: Arc<dyn Notifier>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        Self {
            config: Mutex::new(config),
            store,
            clipboard,
            engine,
            status,
            notifier,
            dialogs,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn modes(&self) -> &'static [EnhancementMode] {
        self.engine.catalog()
    }

    pub fn is_enhancing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Rewrite the current selection in the named style and paste it back.
    ///
    /// Every outcome except a rejected re-entrant trigger produces exactly
    /// one notification.
    pub async fn enhance(&self, mode_name: &str) -> Result<(), FixError> {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            tracing::warn!(mode = mode_name, "ignoring trigger, an enhancement is already running");
            return Err(FixError::Busy);
        };

        let result = self.run_enhancement(mode_name).await;
        let notice = match &result {
            Ok(()) => Notice::Enhanced {
                mode: mode_name.to_string(),
            },
            Err(e) => Notice::from(e),
        };
        self.notify(notice).await;
        result
    }

    async fn run_enhancement(&self, mode_name: &str) -> Result<(), FixError> {
        let mode = EnhancementMode::by_name(mode_name)
            .ok_or_else(|| FixError::UnknownMode(mode_name.to_string()))?;
        let api_key = self
            .config
            .lock()
            .api_key()
            .map(str::to_owned)
            .ok_or(FixError::ApiKeyMissing)?;

        let clipboard = Arc::clone(&self.clipboard);
        let original = blocking(move || clipboard.capture_selection()).await?;

        let _busy = self.status.busy();
        let enhanced = self.engine.enhance(&api_key, mode.name, &original).await?;

        let clipboard = Arc::clone(&self.clipboard);
        blocking(move || clipboard.replace_selection(&enhanced)).await?;
        tracing::info!(mode = mode.name, "enhanced text pasted");
        Ok(())
    }

    /// Show the API key dialog and persist the answer.
    ///
    /// Returns `Ok(false)` when the user cancels.
    pub async fn configure_api_key(&self) -> Result<bool, FixError> {
        let current = self.config.lock().api_key().unwrap_or_default().to_string();
        let dialogs = Arc::clone(&self.dialogs);
        let answer = blocking(move || {
            dialogs
                .prompt_api_key(&current)
                .map_err(|e| FixError::Automation(format!("{:#}", e)))
        })
        .await;

        let answer = match answer {
            Ok(Some(answer)) => answer,
            Ok(None) => {
                tracing::debug!("API key dialog cancelled");
                return Ok(false);
            }
            Err(e) => {
                self.notify(Notice::from(&e)).await;
                return Err(e);
            }
        };

        let mut updated = self.config.lock().clone();
        updated.set_api_key(Some(answer.trim().to_string()));
        if let Err(e) = self.store.save(&updated) {
            self.notify(Notice::from(&e)).await;
            return Err(e);
        }
        *self.config.lock() = updated;

        self.notify(Notice::ApiKeySaved).await;
        Ok(true)
    }

    /// Show a notification without holding an async worker.
    async fn notify(&self, notice: Notice) {
        let notifier = Arc::clone(&self.notifier);
        let shown = blocking(move || {
            notifier.notify(&notice);
            Ok(())
        })
        .await;
        if let Err(e) = shown {
            tracing::warn!("could not show notification: {}", e);
        }
    }

    pub async fn about(&self) {
        let dialogs = Arc::clone(&self.dialogs);
        let shown = blocking(move || {
            dialogs
                .show_about()
                .map_err(|e| FixError::Automation(format!("{:#}", e)))
        })
        .await;
        if let Err(e) = shown {
            tracing::warn!("{}", e);
        }
    }
}
