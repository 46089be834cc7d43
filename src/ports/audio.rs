use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{AudioDevice, AudioEvent, AudioFrame, CaptureState, SenseError};

/// Port for continuous ambient audio capture.
///
/// Implementations handle platform-specific capture and device management,
/// and publish fixed-length analysis windows to subscribers.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Start continuous capture from the default input device.
    ///
    /// Returns an error if already listening or no device is available.
    async fn start(&self) -> Result<(), SenseError>;

    /// Stop capture and discard buffered audio.
    async fn stop(&self) -> Result<(), SenseError>;

    /// Get the current capture state.
    fn state(&self) -> CaptureState;

    /// Subscribe to analysis windows (16kHz mono PCM).
    ///
    /// Slow subscribers lose the oldest windows rather than stalling capture.
    fn subscribe(&self) -> broadcast::Receiver<AudioFrame>;

    /// Subscribe to capture lifecycle events.
    fn subscribe_events(&self) -> broadcast::Receiver<AudioEvent>;

    /// List available audio input devices.
    fn list_input_devices(&self) -> Result<Vec<AudioDevice>, SenseError>;

    /// Current input RMS level (0.0-1.0), for the status display.
    fn current_level(&self) -> f32;
}
