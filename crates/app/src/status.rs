//! Busy indicator for the status-bar item.
//!
//! While a request is outstanding a ticker task cycles the status title
//! through spinner frames. The task owns the frame index and restores the
//! idle glyph when told to stop. Each start bumps a generation counter and
//! only the ticker of the current generation writes to the display, so a
//! stopped ticker cannot overwrite its successor's frames.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

pub const IDLE_GLYPH: &str = "✍️";
pub const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Show this spinner frame and the progress line
    Busy(&'static str),
    /// Idle glyph, progress line hidden
    Idle,
}

impl StatusUpdate {
    pub fn title(&self) -> &'static str {
        match self {
            StatusUpdate::Busy(frame) => *frame,
            StatusUpdate::Idle => IDLE_GLYPH,
        }
    }

    /// Text of the progress menu line, `None` when it should be hidden.
    pub fn progress_line(&self) -> Option<String> {
        match self {
            StatusUpdate::Busy(frame) => Some(format!("Working... {}", frame)),
            StatusUpdate::Idle => None,
        }
    }
}

/// Where status updates are rendered.
pub trait StatusDisplay: Send + Sync {
    fn update(&self, update: StatusUpdate);
}

pub struct StatusController {
    runtime: Handle,
    display: Arc<dyn StatusDisplay>,
    tick: Duration,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    generation: Arc<Mutex<u64>>,
}

impl StatusController {
    pub fn new(runtime: Handle, display: Arc<dyn StatusDisplay>) -> Self {
        Self {
            runtime,
            display,
            tick: TICK,
            stop_tx: Mutex::new(None),
            generation: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.stop_tx.lock().is_some()
    }

    /// Start the spinner. Does nothing if it is already running.
    pub fn start(&self) {
        let mut stop_tx = self.stop_tx.lock();
        if stop_tx.is_some() {
            tracing::debug!("busy indicator already running");
            return;
        }
        let (tx, mut rx) = oneshot::channel();
        *stop_tx = Some(tx);
        let generation = {
            let mut current = self.generation.lock();
            *current += 1;
            *current
        };

        let display = Arc::clone(&self.display);
        let current = Arc::clone(&self.generation);
        let tick = self.tick;
        self.runtime.spawn(async move {
            // Held across the write so a concurrent start() cannot interleave.
            let show = |update: StatusUpdate| {
                let current = current.lock();
                if *current == generation {
                    display.update(update);
                }
            };
            let mut ticker = tokio::time::interval(tick);
            let mut frame_index = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut rx => break,
                    _ = ticker.tick() => {
                        show(StatusUpdate::Busy(FRAMES[frame_index]));
                        frame_index = (frame_index + 1) % FRAMES.len();
                    }
                }
            }
            show(StatusUpdate::Idle);
        });
    }

    /// Signal the spinner to stop. Safe to call when idle.
    pub fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().take() {
            // The task may already be gone if the runtime is shutting down.
            let _ = tx.send(());
        }
    }

    /// Start now, stop when the guard is dropped.
    pub fn busy(&self) -> BusyGuard<'_> {
        self.start();
        BusyGuard { status: self }
    }
}

pub struct BusyGuard<'a> {
    status: &'a StatusController,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.status.stop();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Default)]
    pub(crate) struct RecordingDisplay {
        pub updates: Mutex<Vec<StatusUpdate>>,
    }

    impl StatusDisplay for RecordingDisplay {
        fn update(&self, update: StatusUpdate) {
            self.updates.lock().push(update);
        }
    }

    impl RecordingDisplay {
        pub fn last(&self) -> Option<StatusUpdate> {
            self.updates.lock().last().copied()
        }

        pub fn busy_frames(&self) -> usize {
            self.updates
                .lock()
                .iter()
                .filter(|u| matches!(u, StatusUpdate::Busy(_)))
                .count()
        }

        /// Wait until the ticker has restored the idle display.
        pub async fn wait_for_idle(&self) {
            for _ in 0..200 {
                if self.last() == Some(StatusUpdate::Idle) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            panic!("display never returned to idle: {:?}", self.updates.lock());
        }
    }

    fn controller(display: &Arc<RecordingDisplay>) -> StatusController {
        StatusController::new(Handle::current(), display.clone()).with_tick(Duration::from_millis(5))
    }

    #[test]
    fn test_status_update_text() {
        assert_eq!(StatusUpdate::Busy("⠋").title(), "⠋");
        assert_eq!(
            StatusUpdate::Busy("⠋").progress_line().as_deref(),
            Some("Working... ⠋")
        );
        assert_eq!(StatusUpdate::Idle.title(), "✍️");
        assert_eq!(StatusUpdate::Idle.progress_line(), None);
    }

    #[tokio::test]
    async fn test_start_cycles_frames_then_stop_restores_idle() {
        let display = Arc::new(RecordingDisplay::default());
        let status = controller(&display);

        status.start();
        assert!(status.is_busy());
        tokio::time::sleep(Duration::from_millis(40)).await;
        status.stop();
        assert!(!status.is_busy());
        display.wait_for_idle().await;

        let updates = display.updates.lock().clone();
        assert!(updates.len() >= 3);
        assert_eq!(updates[0], StatusUpdate::Busy(FRAMES[0]));
        assert_eq!(updates[1], StatusUpdate::Busy(FRAMES[1]));
        // Nothing after the idle update
        assert_eq!(updates.last(), Some(&StatusUpdate::Idle));
        assert_eq!(
            updates.iter().filter(|u| **u == StatusUpdate::Idle).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_frames_wrap_around() {
        let display = Arc::new(RecordingDisplay::default());
        let status = controller(&display);

        status.start();
        while display.busy_frames() <= FRAMES.len() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        status.stop();
        display.wait_for_idle().await;

        let updates = display.updates.lock().clone();
        assert_eq!(updates[FRAMES.len()], StatusUpdate::Busy(FRAMES[0]));
    }

    #[tokio::test]
    async fn test_start_while_busy_is_noop() {
        let display = Arc::new(RecordingDisplay::default());
        let status = controller(&display);

        status.start();
        status.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        status.stop();
        display.wait_for_idle().await;

        // A second ticker would have produced a second idle update.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let idles = display
            .updates
            .lock()
            .iter()
            .filter(|u| **u == StatusUpdate::Idle)
            .count();
        assert_eq!(idles, 1);
    }

    #[tokio::test]
    async fn test_restart_is_not_overwritten_by_previous_ticker() {
        let display = Arc::new(RecordingDisplay::default());
        let status = controller(&display);

        status.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        status.stop();
        status.start();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(display.last(), Some(StatusUpdate::Busy(_))));
        assert!(!display.updates.lock().contains(&StatusUpdate::Idle));

        status.stop();
        display.wait_for_idle().await;
        let idles = display
            .updates
            .lock()
            .iter()
            .filter(|u| **u == StatusUpdate::Idle)
            .count();
        assert_eq!(idles, 1);
    }

    #[tokio::test]
    async fn test_guard_stops_on_drop_and_stop_is_idempotent() {
        let display = Arc::new(RecordingDisplay::default());
        let status = controller(&display);

        {
            let _busy = status.busy();
            assert!(status.is_busy());
        }
        assert!(!status.is_busy());
        status.stop();
        display.wait_for_idle().await;
    }
}
