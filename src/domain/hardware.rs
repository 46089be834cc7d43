use serde::{Deserialize, Serialize};

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuArch {
    /// x86-64 (AMD64/Intel 64).
    X86_64,
    /// ARM64 (AArch64, Raspberry Pi 3+).
    Arm64,
    /// 32-bit ARM (older Raspberry Pi boards).
    Arm,
    /// Unknown or unsupported architecture.
    Unknown,
}

impl CpuArch {
    /// Detect the current CPU architecture.
    pub fn detect() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => CpuArch::X86_64,
            "aarch64" => CpuArch::Arm64,
            "arm" => CpuArch::Arm,
            _ => CpuArch::Unknown,
        }
    }
}

impl std::fmt::Display for CpuArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CpuArch::X86_64 => write!(f, "x86_64"),
            CpuArch::Arm64 => write!(f, "arm64"),
            CpuArch::Arm => write!(f, "arm"),
            CpuArch::Unknown => write!(f, "unknown"),
        }
    }
}

/// Operating system type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsType {
    MacOS,
    Windows,
    Linux,
    Unknown,
}

impl OsType {
    /// Detect the current operating system.
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "macos" => OsType::MacOS,
            "windows" => OsType::Windows,
            "linux" => OsType::Linux,
            _ => OsType::Unknown,
        }
    }
}

impl std::fmt::Display for OsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsType::MacOS => write!(f, "macOS"),
            OsType::Windows => write!(f, "Windows"),
            OsType::Linux => write!(f, "Linux"),
            OsType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Detected hardware capabilities of the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub os: OsType,
    pub arch: CpuArch,
    /// Running on an embedded board (Raspberry Pi).
    pub embedded_board: bool,
    /// An audio input device is present.
    pub has_audio: bool,
    /// An interactive display is available.
    pub has_display: bool,
    /// The headless marker file exists, forcing headless operation.
    pub headless_marker: bool,
}

impl HardwareProfile {
    /// Whether the dashboard may be started at all.
    pub fn display_available(&self) -> bool {
        self.has_display && !self.headless_marker
    }

    /// One-line summary for the startup log.
    pub fn summary(&self) -> String {
        format!(
            "os={} arch={} embedded={} audio={} display={} headless_marker={}",
            self.os,
            self.arch,
            self.embedded_board,
            self.has_audio,
            self.has_display,
            self.headless_marker
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_and_os_detect_something() {
        let arch = CpuArch::detect();
        assert!(matches!(
            arch,
            CpuArch::X86_64 | CpuArch::Arm64 | CpuArch::Arm | CpuArch::Unknown
        ));
        let os = OsType::detect();
        assert!(matches!(
            os,
            OsType::MacOS | OsType::Windows | OsType::Linux | OsType::Unknown
        ));
    }

    #[test]
    fn marker_file_forces_headless() {
        let profile = HardwareProfile {
            os: OsType::Linux,
            arch: CpuArch::Arm64,
            embedded_board: true,
            has_audio: true,
            has_display: true,
            headless_marker: true,
        };
        assert!(!profile.display_available());
    }

    #[test]
    fn display_available_needs_a_display() {
        let profile = HardwareProfile {
            os: OsType::Linux,
            arch: CpuArch::X86_64,
            embedded_board: false,
            has_audio: false,
            has_display: false,
            headless_marker: false,
        };
        assert!(!profile.display_available());
    }
}
