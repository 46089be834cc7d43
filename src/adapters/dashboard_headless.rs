use tracing::debug;

use crate::ports::Dashboard;

/// No-op display used when no interactive terminal is available or the
/// dashboard failed to initialize. Calls are logged and otherwise dropped.
#[derive(Debug, Default)]
pub struct HeadlessDashboard;

impl HeadlessDashboard {
    pub fn new() -> Self {
        Self
    }
}

impl Dashboard for HeadlessDashboard {
    fn show_notification(&self, message: &str) {
        debug!(message, "Notification (headless)");
    }

    fn update_speech_text(&self, text: &str) {
        debug!(text, "Speech text (headless)");
    }

    fn update_status_message(&self, status: &str) {
        debug!(status, "Status (headless)");
    }

    fn shutdown(&self) {}

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_calls_are_noops() {
        let dashboard = HeadlessDashboard::new();
        dashboard.show_notification("Detected: Doorbell");
        dashboard.update_speech_text("hello");
        dashboard.update_status_message("System active");
        dashboard.shutdown();
        assert!(!dashboard.is_interactive());
    }
}
