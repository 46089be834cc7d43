use std::path::Path;

use async_trait::async_trait;

use crate::domain::{SenseError, SpeechSegment, Transcript};

/// Port for speech-to-text recognition.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe one speech segment.
    ///
    /// An empty transcript is a valid result for unintelligible audio.
    async fn transcribe(&self, segment: &SpeechSegment) -> Result<Transcript, SenseError>;

    /// Whether the recognizer is ready to transcribe.
    fn is_available(&self) -> bool;

    /// Load a speech model from the given path.
    async fn load_model(&self, path: &Path) -> Result<(), SenseError>;

    /// Unload the current model to free resources.
    fn unload_model(&self);
}
