use crate::domain::{AudioFrame, Detection, EventCatalog};

/// Port for sound-event classification.
///
/// Classification is synchronous CPU work on one analysis window; callers
/// decide where it runs.
pub trait SoundClassifier: Send + Sync {
    /// Classify one analysis window.
    ///
    /// Returns the best-matching catalog event at or above its configured
    /// confidence, or None for silence and unrecognized sound.
    fn classify(&self, frame: &AudioFrame) -> Option<Detection>;

    /// The sound-event catalog this classifier matches against.
    fn catalog(&self) -> &EventCatalog;
}
