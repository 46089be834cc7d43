use crate::domain::{HardwareProfile, SenseError};

/// Port for hardware capability detection.
pub trait HardwareDetector: Send + Sync {
    /// Detect the host's capabilities.
    ///
    /// The result is cached after the first call.
    fn detect(&self) -> Result<HardwareProfile, SenseError>;
}
