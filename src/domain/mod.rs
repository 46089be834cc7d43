pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod hardware;
pub mod model;
pub mod speech;

pub use audio::{AtomicCaptureState, AudioDevice, AudioEvent, AudioFrame, CaptureConfig, CaptureState};
pub use config::AppConfig;
pub use error::SenseError;
pub use events::{Detection, EventCatalog, Priority, SoundEventSpec, SoundFeatures};
pub use hardware::HardwareProfile;
pub use model::{ArtifactStatus, ModelArtifact};
pub use speech::{SegmentBuilder, SegmenterConfig, SpeechSegment, Transcript};
