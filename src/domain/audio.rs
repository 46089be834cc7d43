use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::config::AudioSection;

/// Capture pipeline state machine.
///
/// State transitions:
/// - Idle -> Listening (start)
/// - Listening -> Idle (stop)
/// - Listening -> DeviceLost (device disconnected, automatic)
/// - DeviceLost -> Error (capture cannot continue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CaptureState {
    /// Ready, no active capture.
    Idle = 0,
    /// Continuously capturing ambient audio.
    Listening = 1,
    /// Input device was disconnected.
    DeviceLost = 2,
    /// Unrecoverable error occurred.
    Error = 3,
}

impl CaptureState {
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self, CaptureState::Idle)
    }

    #[must_use]
    pub fn can_stop(&self) -> bool {
        matches!(self, CaptureState::Listening)
    }
}

impl From<u8> for CaptureState {
    fn from(value: u8) -> Self {
        match value {
            0 => CaptureState::Idle,
            1 => CaptureState::Listening,
            2 => CaptureState::DeviceLost,
            _ => CaptureState::Error,
        }
    }
}

impl From<CaptureState> for u8 {
    fn from(state: CaptureState) -> Self {
        state as u8
    }
}

/// Atomic wrapper for CaptureState for lock-free reads from the audio thread.
#[derive(Debug)]
pub struct AtomicCaptureState(AtomicU8);

impl AtomicCaptureState {
    pub fn new(state: CaptureState) -> Self {
        Self(AtomicU8::new(state.into()))
    }

    pub fn load(&self) -> CaptureState {
        self.0.load(Ordering::Acquire).into()
    }

    pub fn store(&self, state: CaptureState) {
        self.0.store(state.into(), Ordering::Release);
    }
}

impl Default for AtomicCaptureState {
    fn default() -> Self {
        Self::new(CaptureState::Idle)
    }
}

/// Settings for the continuous capture pipeline.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate in Hz.
    pub sample_rate: u32,
    /// Analysis window length in milliseconds.
    pub window_ms: u32,
    /// Ring buffer capacity in seconds.
    pub ring_secs: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::from(&AudioSection::default())
    }
}

impl From<&AudioSection> for CaptureConfig {
    fn from(section: &AudioSection) -> Self {
        Self {
            sample_rate: section.sample_rate,
            window_ms: section.window_ms,
            ring_secs: section.ring_secs,
        }
    }
}

impl CaptureConfig {
    /// Number of samples in one analysis window.
    pub fn window_len(&self) -> usize {
        (self.sample_rate as u64 * self.window_ms as u64 / 1000) as usize
    }

    /// Ring buffer capacity in samples.
    pub fn ring_capacity(&self) -> usize {
        self.ring_secs as usize * self.sample_rate as usize
    }
}

/// One analysis window of captured audio: 16-bit mono PCM plus its RMS level.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    /// RMS level normalized to 0.0-1.0.
    pub rms: f32,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        let rms = rms_level(&samples);
        Self {
            samples,
            sample_rate,
            rms,
        }
    }

    /// Duration of the frame in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }
}

/// RMS of 16-bit samples, normalized to 0.0-1.0.
pub fn rms_level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
    let rms = (sum_squares / samples.len() as f64).sqrt();
    (rms / 32767.0).min(1.0) as f32
}

/// Events emitted by the capture pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum AudioEvent {
    /// Capture state changed.
    StateChanged { from: CaptureState, to: CaptureState },
    /// Input device was lost.
    DeviceLost { device_name: String },
    /// An error occurred in the capture stream.
    Error { message: String },
}

/// Input audio device information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Unique device identifier.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the system default device.
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_state_transitions() {
        assert!(CaptureState::Idle.can_start());
        assert!(!CaptureState::Listening.can_start());
        assert!(!CaptureState::DeviceLost.can_start());

        assert!(CaptureState::Listening.can_stop());
        assert!(!CaptureState::Idle.can_stop());
    }

    #[test]
    fn capture_state_roundtrip() {
        for state in [
            CaptureState::Idle,
            CaptureState::Listening,
            CaptureState::DeviceLost,
            CaptureState::Error,
        ] {
            let value: u8 = state.into();
            let back: CaptureState = value.into();
            assert_eq!(state, back);
        }
    }

    #[test]
    fn atomic_capture_state() {
        let state = AtomicCaptureState::default();
        assert_eq!(state.load(), CaptureState::Idle);

        state.store(CaptureState::Listening);
        assert_eq!(state.load(), CaptureState::Listening);
    }

    #[test]
    fn window_len_follows_sample_rate() {
        let config = CaptureConfig {
            sample_rate: 16_000,
            window_ms: 975,
            ring_secs: 10,
        };
        assert_eq!(config.window_len(), 15_600);
        assert_eq!(config.ring_capacity(), 160_000);
    }

    #[test]
    fn rms_of_silence_and_full_scale() {
        assert_eq!(rms_level(&[]), 0.0);
        assert_eq!(rms_level(&[0, 0, 0]), 0.0);

        let max = rms_level(&[32767, 32767, 32767]);
        assert!((max - 1.0).abs() < 0.001);
    }

    #[test]
    fn frame_precomputes_rms() {
        let frame = AudioFrame::new(vec![16384, -16384, 16384, -16384], 16_000);
        assert!(frame.rms > 0.4 && frame.rms < 0.6);
        assert_eq!(frame.duration_ms(), 0);
    }
}
