use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    /// Target sample rate in Hz. Classification and speech both expect 16kHz.
    pub sample_rate: u32,
    /// Length of one analysis window in milliseconds.
    pub window_ms: u32,
    /// Capacity of the capture ring buffer in seconds.
    pub ring_secs: u32,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            window_ms: 975,
            ring_secs: 10,
        }
    }
}

/// Sound-event classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationSection {
    /// Enable ambient sound classification.
    pub enabled: bool,
    /// Windows with RMS below this level are treated as silence.
    pub energy_floor: f32,
}

impl Default for ClassificationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            energy_floor: 0.01,
        }
    }
}

/// Speech-to-text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSection {
    /// Enable speech recognition.
    pub enabled: bool,
    /// Language code (ISO 639-1, e.g. "en"), or "auto" for detection.
    pub language: String,
    /// A window opens a speech segment when its RMS exceeds this level.
    pub energy_threshold: f32,
    /// Quiet time that closes an open segment, in milliseconds.
    pub pause_ms: u64,
    /// Hard upper bound on segment length, in milliseconds.
    pub phrase_limit_ms: u64,
    /// Path to the speech model file. Resolved against the models directory
    /// when relative; defaults to a ggml whisper model name when unset.
    pub model_path: Option<PathBuf>,
    /// Seconds between phrases emitted by the simulated recognizer.
    pub simulation_interval_secs: u64,
}

impl Default for SpeechSection {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en".to_string(),
            energy_threshold: 0.02,
            pause_ms: 800,
            phrase_limit_ms: 5_000,
            model_path: None,
            simulation_interval_secs: 20,
        }
    }
}

/// Notification routing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsSection {
    /// Allow haptic delivery through the wearable.
    pub haptic: bool,
    /// Allow visual delivery through the dashboard.
    pub visual: bool,
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            haptic: true,
            visual: true,
        }
    }
}

/// Wearable link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WearableSection {
    /// Socket address of the wearable bridge (e.g. "192.168.1.40:7007").
    /// When unset the simulated wearable is used.
    pub address: Option<String>,
    /// Name announced in the hello handshake.
    pub device_name: String,
    /// Idle delay between connection checks, in seconds.
    pub reconnect_secs: u64,
    /// Backoff after a failed connection attempt, in seconds.
    pub error_backoff_secs: u64,
}

impl Default for WearableSection {
    fn default() -> Self {
        Self {
            address: None,
            device_name: "SenseBridge".to_string(),
            reconnect_secs: 5,
            error_backoff_secs: 10,
        }
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Number of notifications kept on screen.
    pub max_notifications: usize,
    /// Show classifier confidence next to event names.
    pub show_confidence: bool,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            max_notifications: 8,
            show_confidence: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioSection,
    pub classification: ClassificationSection,
    pub speech: SpeechSection,
    pub notifications: NotificationsSection,
    pub wearable: WearableSection,
    pub ui: UiSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::new();
        assert_eq!(config.audio.sample_rate, 16_000);
        assert!(config.classification.enabled);
        assert!(config.speech.enabled);
        assert!(config.wearable.address.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [speech]
            language = "de"

            [wearable]
            address = "127.0.0.1:7007"
            "#,
        )
        .unwrap();

        assert_eq!(config.speech.language, "de");
        assert_eq!(config.speech.pause_ms, 800);
        assert_eq!(config.wearable.address.as_deref(), Some("127.0.0.1:7007"));
        assert_eq!(config.audio.sample_rate, 16_000);
    }
}
