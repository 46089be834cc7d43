use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, warn};

use cpal::traits::HostTrait;

use crate::domain::hardware::{CpuArch, OsType};
use crate::domain::{HardwareProfile, SenseError};
use crate::ports::HardwareDetector;

/// Marker file that forces headless operation, for embedded units that have
/// a framebuffer but no attached screen.
pub const HEADLESS_MARKER: &str = ".sensebridge-headless";

/// Probes host capabilities; the profile is cached after the first call.
pub struct SystemHardwareDetector {
    home: PathBuf,
    profile: OnceLock<HardwareProfile>,
}

impl SystemHardwareDetector {
    pub fn new(home: PathBuf) -> Self {
        Self {
            home,
            profile: OnceLock::new(),
        }
    }

    fn probe(&self) -> HardwareProfile {
        let os = OsType::detect();
        let arch = CpuArch::detect();
        let embedded_board = Self::is_embedded_board();
        let has_display = Self::display_present(
            os,
            embedded_board,
            std::env::var("DISPLAY").ok().as_deref(),
            std::env::var("WAYLAND_DISPLAY").ok().as_deref(),
        );
        let has_audio = Self::audio_input_present();
        let headless_marker = self.home.join(HEADLESS_MARKER).exists();

        let profile = HardwareProfile {
            os,
            arch,
            embedded_board,
            has_audio,
            has_display,
            headless_marker,
        };

        info!(summary = %profile.summary(), "Hardware profile detected");
        profile
    }

    /// Raspberry Pi detection via the device-tree model string or the
    /// Raspberry Pi OS issue file.
    fn is_embedded_board() -> bool {
        if let Ok(model) = std::fs::read_to_string("/proc/device-tree/model") {
            if model.contains("Raspberry Pi") {
                return true;
            }
        }
        Path::new("/etc/rpi-issue").exists()
    }

    fn display_present(
        os: OsType,
        embedded_board: bool,
        display_env: Option<&str>,
        wayland_env: Option<&str>,
    ) -> bool {
        match os {
            // Desktop window servers are always reachable.
            OsType::MacOS | OsType::Windows => true,
            OsType::Linux | OsType::Unknown => {
                if display_env.is_some_and(|v| !v.is_empty())
                    || wayland_env.is_some_and(|v| !v.is_empty())
                {
                    return true;
                }
                // An embedded board may drive a screen through the
                // framebuffer without a display server.
                embedded_board && Path::new("/dev/fb0").exists()
            }
        }
    }

    fn audio_input_present() -> bool {
        match cpal::default_host().input_devices() {
            Ok(devices) => devices.count() > 0,
            Err(e) => {
                warn!(error = %e, "Audio capture not available");
                false
            }
        }
    }
}

impl HardwareDetector for SystemHardwareDetector {
    fn detect(&self) -> Result<HardwareProfile, SenseError> {
        Ok(self.profile.get_or_init(|| self.probe()).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn profile_is_cached() {
        let dir = tempdir().unwrap();
        let detector = SystemHardwareDetector::new(dir.path().to_path_buf());

        let first = detector.detect().unwrap();
        let second = detector.detect().unwrap();
        assert_eq!(first.has_display, second.has_display);
        assert_eq!(first.embedded_board, second.embedded_board);
    }

    #[test]
    fn marker_file_is_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(HEADLESS_MARKER), b"").unwrap();

        let detector = SystemHardwareDetector::new(dir.path().to_path_buf());
        assert!(detector.detect().unwrap().headless_marker);
    }

    #[test]
    fn display_env_governs_linux() {
        assert!(SystemHardwareDetector::display_present(
            OsType::Linux,
            false,
            Some(":0"),
            None
        ));
        assert!(SystemHardwareDetector::display_present(
            OsType::Linux,
            false,
            None,
            Some("wayland-1")
        ));
        assert!(!SystemHardwareDetector::display_present(
            OsType::Linux,
            false,
            None,
            None
        ));
        assert!(!SystemHardwareDetector::display_present(
            OsType::Linux,
            false,
            Some(""),
            None
        ));
    }

    #[test]
    fn desktop_oses_always_have_a_display() {
        assert!(SystemHardwareDetector::display_present(
            OsType::MacOS,
            false,
            None,
            None
        ));
        assert!(SystemHardwareDetector::display_present(
            OsType::Windows,
            false,
            None,
            None
        ));
    }
}
