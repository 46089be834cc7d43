use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::domain::config::SpeechSection;
use crate::domain::{SenseError, SpeechSegment, Transcript};
use crate::ports::SpeechRecognizer;

/// Speech recognizer backed by whisper.cpp.
pub struct WhisperRecognizer {
    context: RwLock<Option<Arc<WhisperContext>>>,
    threads: u32,
    language: Option<String>,
}

impl WhisperRecognizer {
    /// Create a recognizer from the speech configuration.
    ///
    /// Thread count is auto-detected (cores - 1, minimum 1). "auto" as the
    /// configured language enables whisper's language detection.
    pub fn new(config: &SpeechSection) -> Self {
        let threads = std::thread::available_parallelism()
            .map(|p| std::cmp::max(1, p.get() as u32 - 1))
            .unwrap_or(1);

        let language = match config.language.as_str() {
            "auto" | "" => None,
            lang => Some(lang.to_string()),
        };

        info!(threads, language = ?language, "WhisperRecognizer created");

        Self {
            context: RwLock::new(None),
            threads,
            language,
        }
    }

    /// Convert i16 samples to f32 in [-1, 1] as whisper expects.
    fn convert_samples(samples: &[i16]) -> Vec<f32> {
        samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn transcribe(&self, segment: &SpeechSegment) -> Result<Transcript, SenseError> {
        let context = self.context.read().clone();
        let ctx = context.ok_or_else(|| SenseError::Speech("No model loaded".to_string()))?;

        if segment.sample_rate() != 16_000 {
            return Err(SenseError::Speech(format!(
                "Expected 16kHz audio, got {}Hz",
                segment.sample_rate()
            )));
        }

        if segment.is_empty() {
            return Ok(Transcript {
                text: String::new(),
                language: None,
                duration_ms: 0,
            });
        }

        let samples = Self::convert_samples(segment.samples());
        let threads = self.threads;
        let language = self.language.clone();

        debug!(
            samples = samples.len(),
            duration_secs = segment.duration_secs(),
            "Starting transcription"
        );

        let start = std::time::Instant::now();

        // Inference is CPU-bound; keep it off the async workers.
        let (text, detected) = tokio::task::spawn_blocking(move || {
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

            params.set_n_threads(threads as i32);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);
            params.set_suppress_non_speech_tokens(true);

            if let Some(ref lang) = language {
                params.set_language(Some(lang));
            }

            let mut state = ctx
                .create_state()
                .map_err(|e| SenseError::Speech(format!("Failed to create whisper state: {}", e)))?;

            state
                .full(params, &samples)
                .map_err(|e| SenseError::Speech(format!("Transcription failed: {}", e)))?;

            let num_segments = state
                .full_n_segments()
                .map_err(|e| SenseError::Speech(format!("Failed to get segment count: {}", e)))?;

            let mut text = String::new();
            for i in 0..num_segments {
                if let Ok(segment_text) = state.full_get_segment_text(i) {
                    text.push_str(&segment_text);
                }
            }

            let detected = state
                .full_lang_id_from_state()
                .ok()
                .and_then(|id| whisper_rs::get_lang_str(id).map(|s| s.to_string()));

            Ok::<(String, Option<String>), SenseError>((text.trim().to_string(), detected))
        })
        .await
        .map_err(|e| SenseError::Speech(format!("Task join error: {}", e)))??;

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            text_len = text.len(),
            duration_ms,
            detected_language = ?detected,
            "Transcription complete"
        );

        Ok(Transcript {
            text,
            language: detected,
            duration_ms,
        })
    }

    fn is_available(&self) -> bool {
        self.context.read().is_some()
    }

    async fn load_model(&self, path: &Path) -> Result<(), SenseError> {
        if !path.exists() {
            return Err(SenseError::Model(format!(
                "Speech model not found: {}",
                path.display()
            )));
        }

        info!(path = ?path, "Loading speech model");

        let path_str = path.to_string_lossy().to_string();
        let ctx = tokio::task::spawn_blocking(move || {
            WhisperContext::new_with_params(&path_str, WhisperContextParameters::default())
                .map_err(|e| SenseError::Speech(format!("Failed to load model: {}", e)))
        })
        .await
        .map_err(|e| SenseError::Speech(format!("Task join error: {}", e)))??;

        *self.context.write() = Some(Arc::new(ctx));

        info!(path = ?path, "Speech model loaded");
        Ok(())
    }

    fn unload_model(&self) {
        let had_model = self.context.read().is_some();
        *self.context.write() = None;

        if had_model {
            info!("Speech model unloaded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> SpeechSection {
        SpeechSection::default()
    }

    #[test]
    fn sample_conversion_covers_the_range() {
        let converted = WhisperRecognizer::convert_samples(&[0, 16384, -16384, 32767, -32768]);
        assert!((converted[0] - 0.0).abs() < 0.001);
        assert!((converted[1] - 0.5).abs() < 0.001);
        assert!((converted[2] + 0.5).abs() < 0.001);
        assert!((converted[3] - 1.0).abs() < 0.001);
        assert!((converted[4] + 1.0).abs() < 0.001);
    }

    #[test]
    fn starts_without_a_model() {
        let recognizer = WhisperRecognizer::new(&section());
        assert!(!recognizer.is_available());
    }

    #[test]
    fn auto_language_maps_to_detection() {
        let mut config = section();
        config.language = "auto".to_string();
        let recognizer = WhisperRecognizer::new(&config);
        assert!(recognizer.language.is_none());

        config.language = "de".to_string();
        let recognizer = WhisperRecognizer::new(&config);
        assert_eq!(recognizer.language.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn missing_model_path_is_an_error() {
        let recognizer = WhisperRecognizer::new(&section());
        let result = recognizer
            .load_model(Path::new("/nonexistent/model.bin"))
            .await;
        assert!(result.is_err());
    }
}
