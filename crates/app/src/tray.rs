//! Status-bar item, its menu and the main-thread event loop.
//!
//! Tray objects live on the main thread only. Menu clicks arrive on
//! tray-icon's global channel and are forwarded into the event loop; busy
//! frames from the status ticker arrive the same way.

use crate::shell::AppShell;
use crate::status::{StatusDisplay, StatusUpdate, IDLE_GLYPH};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared::EnhancementMode;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::event::{Event, StartCause};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};

#[derive(Debug)]
pub enum UserEvent {
    Menu(MenuEvent),
    Status(StatusUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Enhance(&'static EnhancementMode),
    SetApiKey,
    About,
    Quit,
}

/// Forwards busy-indicator updates to the main thread.
pub struct TrayStatus {
    proxy: Mutex<EventLoopProxy<UserEvent>>,
}

impl TrayStatus {
    pub fn new(proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }
}

impl StatusDisplay for TrayStatus {
    fn update(&self, update: StatusUpdate) {
        if self.proxy.lock().send_event(UserEvent::Status(update)).is_err() {
            tracing::debug!("event loop closed, dropping status update");
        }
    }
}

struct TrayHandle {
    tray: TrayIcon,
    menu: Menu,
    progress: MenuItem,
    /// Menu position of the progress line while shown
    progress_position: usize,
    progress_shown: bool,
    actions: Vec<(MenuId, MenuAction)>,
}

impl TrayHandle {
    fn build(modes: &'static [EnhancementMode]) -> Result<Self> {
        let menu = Menu::new();
        let mut actions = Vec::new();

        for mode in modes {
            let item = MenuItem::new(mode.menu_label(), true, None);
            menu.append(&item).context("failed to build menu")?;
            actions.push((item.id().clone(), MenuAction::Enhance(mode)));
        }
        menu.append(&PredefinedMenuItem::separator())
            .context("failed to build menu")?;
        let progress_position = modes.len() + 1;

        // Hidden until a request is running
        let progress = MenuItem::new("", false, None);

        let api_key = MenuItem::new("Set API Key", true, None);
        let about = MenuItem::new("About", true, None);
        let quit = MenuItem::new("Quit", true, None);
        menu.append_items(&[
            &PredefinedMenuItem::separator(),
            &api_key,
            &PredefinedMenuItem::separator(),
            &about,
            &quit,
        ])
        .context("failed to build menu")?;
        actions.push((api_key.id().clone(), MenuAction::SetApiKey));
        actions.push((about.id().clone(), MenuAction::About));
        actions.push((quit.id().clone(), MenuAction::Quit));

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu.clone()))
            .with_tooltip("Fix AI")
            .with_title(IDLE_GLYPH)
            .build()
            .context("failed to create status item")?;

        Ok(Self {
            tray,
            menu,
            progress,
            progress_position,
            progress_shown: false,
            actions,
        })
    }

    fn action_for(&self, id: &MenuId) -> Option<MenuAction> {
        self.actions
            .iter()
            .find(|(item_id, _)| item_id == id)
            .map(|(_, action)| *action)
    }

    fn apply(&mut self, update: StatusUpdate) {
        self.tray.set_title(Some(update.title()));
        match update.progress_line() {
            Some(line) => {
                self.progress.set_text(line);
                if !self.progress_shown {
                    match self.menu.insert(&self.progress, self.progress_position) {
                        Ok(()) => self.progress_shown = true,
                        Err(e) => tracing::warn!("could not show progress line: {}", e),
                    }
                }
            }
            None => {
                if self.progress_shown {
                    if let Err(e) = self.menu.remove(&self.progress) {
                        tracing::warn!("could not hide progress line: {}", e);
                    }
                    self.progress_shown = false;
                }
            }
        }
    }
}

pub fn build_event_loop() -> Result<EventLoop<UserEvent>> {
    let mut builder = EventLoopBuilder::<UserEvent>::with_user_event();
    #[cfg(target_os = "macos")]
    {
        use winit::platform::macos::{ActivationPolicy, EventLoopBuilderExtMacOS};
        // Menu-bar only, no Dock icon
        builder.with_activation_policy(ActivationPolicy::Accessory);
    }
    builder.build().context("failed to create event loop")
}

/// Run the menu-bar app until Quit.
pub fn run(event_loop: EventLoop<UserEvent>, runtime: Runtime, shell: Arc<AppShell>) -> Result<()> {
    let menu_proxy = event_loop.create_proxy();
    std::thread::spawn(move || {
        let rx = MenuEvent::receiver();
        while let Ok(event) = rx.recv() {
            if menu_proxy.send_event(UserEvent::Menu(event)).is_err() {
                break;
            }
        }
    });

    let mut tray: Option<TrayHandle> = None;
    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        match event {
            Event::NewEvents(StartCause::Init) => match TrayHandle::build(shell.modes()) {
                Ok(handle) => {
                    tracing::info!("status item ready");
                    tray = Some(handle);
                }
                Err(e) => {
                    tracing::error!("{:#}", e);
                    elwt.exit();
                }
            },
            Event::UserEvent(UserEvent::Menu(event)) => {
                let Some(action) = tray.as_ref().and_then(|t| t.action_for(&event.id)) else {
                    return;
                };
                let shell = Arc::clone(&shell);
                match action {
                    MenuAction::Enhance(mode) => {
                        runtime.spawn(async move {
                            // Outcomes are reported through notifications.
                            let _ = shell.enhance(mode.name).await;
                        });
                    }
                    MenuAction::SetApiKey => {
                        runtime.spawn(async move {
                            let _ = shell.configure_api_key().await;
                        });
                    }
                    MenuAction::About => {
                        runtime.spawn(async move { shell.about().await });
                    }
                    MenuAction::Quit => elwt.exit(),
                }
            }
            Event::UserEvent(UserEvent::Status(update)) => {
                if let Some(handle) = tray.as_mut() {
                    handle.apply(update);
                }
            }
            _ => {}
        }
    })?;
    Ok(())
}
