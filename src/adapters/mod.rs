pub mod audio_cpal;
pub mod classifier;
pub mod config_store;
pub mod dashboard_headless;
pub mod dashboard_tui;
pub mod hardware_detector;
pub mod http_fetcher;
pub mod model_fetcher;
pub mod simulated_speech;
pub mod wearable;
pub mod whisper;

pub use audio_cpal::CpalAudioCapture;
pub use classifier::SpectralClassifier;
pub use config_store::TomlConfigStore;
pub use dashboard_headless::HeadlessDashboard;
pub use dashboard_tui::TerminalDashboard;
pub use hardware_detector::SystemHardwareDetector;
pub use http_fetcher::ReqwestFetcher;
pub use model_fetcher::ModelFetcher;
pub use simulated_speech::SimulatedSpeech;
pub use wearable::{SimulatedWearable, SocketWearable};
pub use whisper::WhisperRecognizer;
