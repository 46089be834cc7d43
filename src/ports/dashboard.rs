/// Port for the user-facing display.
///
/// All methods take plain strings and never fail; delivery is best-effort.
/// The application shell guards these calls, so implementations may assume
/// non-empty input.
pub trait Dashboard: Send + Sync {
    /// Surface a notification banner.
    fn show_notification(&self, message: &str);

    /// Replace the live speech caption.
    fn update_speech_text(&self, text: &str);

    /// Replace the status line.
    fn update_status_message(&self, status: &str);

    /// Tear the display down and restore the terminal.
    fn shutdown(&self);

    /// Whether this display actually renders anything.
    fn is_interactive(&self) -> bool;
}
