pub mod audio;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod hardware;
pub mod http;
pub mod transcriber;
pub mod wearable;

pub use audio::AudioCapture;
pub use classifier::SoundClassifier;
pub use config::ConfigStore;
pub use dashboard::Dashboard;
pub use hardware::HardwareDetector;
pub use http::{DownloadProgress, HttpFetcher};
pub use transcriber::SpeechRecognizer;
pub use wearable::Wearable;
