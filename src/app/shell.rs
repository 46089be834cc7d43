use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapters::{HeadlessDashboard, TerminalDashboard};
use crate::domain::config::UiSection;
use crate::domain::SenseError;
use crate::ports::Dashboard;

/// Thin application shell owning the display handle.
///
/// Holds the `use_gui` decision made by the factory and guards every display
/// call behind it. `start` attempts dashboard initialization exactly once
/// and degrades to the headless stub on failure instead of erroring, so a
/// broken terminal never takes the pipeline down with it.
pub struct AppShell {
    use_gui: bool,
    dashboard: Box<dyn Dashboard>,
}

impl AppShell {
    /// Create the shell. `use_gui` is the factory's policy decision; until
    /// `start` runs, the display handle is the headless stub.
    pub fn new(use_gui: bool) -> Self {
        Self {
            use_gui,
            dashboard: Box::new(HeadlessDashboard::new()),
        }
    }

    /// Attempt to bring up the terminal dashboard.
    ///
    /// Never fails: on initialization error the shell logs a warning, flips
    /// to headless mode, and keeps the stub handle. Returns the active
    /// display handle either way.
    pub fn start(
        &mut self,
        ui: &UiSection,
        shutdown_tx: mpsc::UnboundedSender<()>,
    ) -> &dyn Dashboard {
        let ui = ui.clone();
        self.start_with(move || {
            TerminalDashboard::init(&ui, shutdown_tx).map(|d| Box::new(d) as Box<dyn Dashboard>)
        })
    }

    /// `start` with an injectable initializer. The initializer is not even
    /// invoked when the shell was created headless.
    pub fn start_with<F>(&mut self, init: F) -> &dyn Dashboard
    where
        F: FnOnce() -> Result<Box<dyn Dashboard>, SenseError>,
    {
        if self.use_gui {
            match init() {
                Ok(dashboard) => {
                    self.dashboard = dashboard;
                    info!("Dashboard started");
                }
                Err(e) => {
                    warn!(error = %e, "Dashboard unavailable, falling back to headless mode");
                    self.use_gui = false;
                }
            }
        } else {
            info!("Running in headless mode");
        }
        self.dashboard.as_ref()
    }

    /// Whether display calls are being forwarded.
    pub fn uses_gui(&self) -> bool {
        self.use_gui
    }

    /// Surface a notification. Empty messages are dropped silently; the
    /// display is only touched in GUI mode.
    pub fn show_notification(&self, message: &str, event_type: Option<&str>) {
        if message.is_empty() {
            return;
        }
        debug!(message, event_type = event_type.unwrap_or("info"), "Notification");
        if self.use_gui {
            self.dashboard.show_notification(message);
        }
    }

    /// Replace the live speech caption. Empty text is dropped silently.
    pub fn update_speech_text(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        info!(text, "Speech recognized");
        if self.use_gui {
            self.dashboard.update_speech_text(text);
        }
    }

    /// Replace the status line. Empty statuses are dropped silently.
    pub fn update_status_message(&self, status: &str) {
        if status.is_empty() {
            return;
        }
        debug!(status, "Status update");
        if self.use_gui {
            self.dashboard.update_status_message(status);
        }
    }

    /// Tear the display down.
    pub fn shutdown(&self) {
        self.dashboard.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// Test double recording every forwarded call.
    #[derive(Default)]
    struct RecordingDashboard {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Dashboard for RecordingDashboard {
        fn show_notification(&self, message: &str) {
            self.calls.lock().push(format!("notify:{}", message));
        }

        fn update_speech_text(&self, text: &str) {
            self.calls.lock().push(format!("speech:{}", text));
        }

        fn update_status_message(&self, status: &str) {
            self.calls.lock().push(format!("status:{}", status));
        }

        fn shutdown(&self) {}

        fn is_interactive(&self) -> bool {
            true
        }
    }

    fn started_shell() -> (AppShell, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = RecordingDashboard {
            calls: Arc::clone(&calls),
        };
        let mut shell = AppShell::new(true);
        shell.start_with(move || Ok(Box::new(recorder) as Box<dyn Dashboard>));
        (shell, calls)
    }

    #[test]
    fn failed_init_falls_back_to_headless() {
        let mut shell = AppShell::new(true);
        let handle = shell.start_with(|| {
            Err(SenseError::Dashboard("no terminal".to_string()))
        });

        // start never propagates the failure and still hands back a handle.
        assert!(!handle.is_interactive());
        assert!(!shell.uses_gui());
    }

    #[test]
    fn headless_shell_never_invokes_the_initializer() {
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);

        let mut shell = AppShell::new(false);
        shell.start_with(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(Box::new(HeadlessDashboard::new()) as Box<dyn Dashboard>)
        });

        assert!(!invoked.load(Ordering::SeqCst));
        assert!(!shell.uses_gui());
    }

    #[test]
    fn empty_input_is_dropped_before_the_display() {
        let (shell, calls) = started_shell();

        shell.show_notification("", None);
        shell.update_speech_text("");
        shell.update_status_message("");

        assert!(calls.lock().is_empty());
    }

    #[test]
    fn nonempty_input_is_forwarded_in_gui_mode() {
        let (shell, calls) = started_shell();

        shell.show_notification("Detected: Doorbell", Some("doorbell"));
        shell.update_speech_text("hello there");
        shell.update_status_message("System active");

        let calls = calls.lock();
        assert_eq!(
            calls.as_slice(),
            [
                "notify:Detected: Doorbell",
                "speech:hello there",
                "status:System active"
            ]
        );
    }

    #[test]
    fn headless_mode_never_touches_the_display() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = RecordingDashboard {
            calls: Arc::clone(&calls),
        };

        // A shell that fell back keeps the stub even though an interactive
        // dashboard exists somewhere; forwarding must stay off.
        let mut shell = AppShell::new(true);
        shell.start_with(|| Err(SenseError::Dashboard("boom".to_string())));
        drop(recorder);

        shell.show_notification("Detected: Alarm", None);
        shell.update_speech_text("text");
        shell.update_status_message("status");

        assert!(calls.lock().is_empty());
        assert!(!shell.uses_gui());
    }
}
