use tokio::sync::mpsc;
use tracing::warn;

use crate::app::shell::AppShell;
use crate::domain::config::UiSection;
use crate::domain::HardwareProfile;

/// Build and start the application shell.
///
/// Headless mode is selected when the caller asked for it, when no display
/// is available, or when the headless marker file is present. The decision
/// is a one-time policy check; the shell does not revisit it.
pub fn create_app(
    prefer_gui: bool,
    profile: &HardwareProfile,
    ui: &UiSection,
    shutdown_tx: mpsc::UnboundedSender<()>,
) -> AppShell {
    let use_gui = prefer_gui && profile.display_available();
    if prefer_gui && !use_gui {
        warn!("No display detected, switching to headless mode");
    }

    let mut shell = AppShell::new(use_gui);
    shell.start(ui, shutdown_tx);
    shell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hardware::{CpuArch, OsType};

    fn profile(has_display: bool, headless_marker: bool) -> HardwareProfile {
        HardwareProfile {
            os: OsType::Linux,
            arch: CpuArch::X86_64,
            embedded_board: false,
            has_audio: false,
            has_display,
            headless_marker,
        }
    }

    fn shutdown_tx() -> mpsc::UnboundedSender<()> {
        mpsc::unbounded_channel().0
    }

    #[test]
    fn no_display_selects_headless() {
        let shell = create_app(true, &profile(false, false), &UiSection::default(), shutdown_tx());
        assert!(!shell.uses_gui());
    }

    #[test]
    fn marker_file_selects_headless() {
        let shell = create_app(true, &profile(true, true), &UiSection::default(), shutdown_tx());
        assert!(!shell.uses_gui());
    }

    #[test]
    fn explicit_headless_wins_over_display() {
        let shell = create_app(false, &profile(true, false), &UiSection::default(), shutdown_tx());
        assert!(!shell.uses_gui());
    }
}
