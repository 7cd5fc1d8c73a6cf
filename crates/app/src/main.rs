//! Fix AI: rewrite the selected text from the menu bar.

use anyhow::{Context, Result};
use providers::OpenAIClient;
use services::{ClipboardBridge, ConfigStore, EnhancementEngine};
use std::sync::Arc;

mod desktop;
mod shell;
mod status;
mod tray;

use desktop::OsaDesktop;
use shell::AppShell;
use status::StatusController;
use tray::TrayStatus;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("fixai-worker")
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let event_loop = tray::build_event_loop()?;

    let desktop = Arc::new(OsaDesktop);
    let store = ConfigStore::default_location().context("could not locate home directory")?;
    let config = shell::load_initial_config(&store, desktop.as_ref());
    tracing::info!(
        path = %store.path().display(),
        has_key = config.api_key().is_some(),
        "config loaded"
    );

    let status = StatusController::new(
        runtime.handle().clone(),
        Arc::new(TrayStatus::new(event_loop.create_proxy())),
    );
    let engine = EnhancementEngine::new(Arc::new(OpenAIClient::new()));
    let shell = Arc::new(AppShell::new(
        config,
        store,
        Arc::new(ClipboardBridge::system()),
        engine,
        status,
        desktop.clone(),
        desktop,
    ));

    tray::run(event_loop, runtime, shell)
}
