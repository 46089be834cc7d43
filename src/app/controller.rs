use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{
    CpalAudioCapture, ModelFetcher, ReqwestFetcher, SimulatedSpeech, SimulatedWearable,
    SocketWearable, SpectralClassifier, SystemHardwareDetector, TomlConfigStore, WhisperRecognizer,
};
use crate::app::factory::create_app;
use crate::app::notifications::{Delivery, NotificationManager};
use crate::app::shell::AppShell;
use crate::domain::{
    AppConfig, AudioEvent, CaptureConfig, Detection, EventCatalog, HardwareProfile, ModelArtifact,
    SegmentBuilder, SegmenterConfig, SenseError, Transcript,
};
use crate::infrastructure::init_logging;
use crate::ports::{
    AudioCapture, ConfigStore, HardwareDetector, SoundClassifier, SpeechRecognizer, Wearable,
};
use crate::setup::{self, WorkspacePaths};

/// Default file name for the speech model inside `<home>/models/`.
const DEFAULT_SPEECH_MODEL: &str = "ggml-base.en.bin";

/// Runtime options from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run without a dashboard even when a display is available.
    pub headless: bool,
    /// Simulated hardware: canned speech phrases, simulated wearable.
    pub simulation: bool,
    /// Stop after this long.
    pub timeout: Option<Duration>,
    /// Log level overriding the configured one (from --debug/--verbose).
    pub log_level_override: Option<String>,
}

/// Main application: owns every component and runs the event loop.
pub struct SenseBridge {
    config: AppConfig,
    profile: HardwareProfile,
    options: RunOptions,
    store: Arc<TomlConfigStore>,
    shell: AppShell,
    capture: Option<Arc<CpalAudioCapture>>,
    classifier: Option<Arc<SpectralClassifier>>,
    recognizer: Option<Arc<WhisperRecognizer>>,
    wearable: Arc<dyn Wearable>,
    notifications: NotificationManager,
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: Option<mpsc::UnboundedReceiver<()>>,
    tasks: Vec<JoinHandle<()>>,
    _log_guard: Option<WorkerGuard>,
}

impl SenseBridge {
    /// Wire the application together: config, logging, hardware detection,
    /// workspace bootstrap, components, and the display shell.
    pub fn new(options: RunOptions) -> Result<Self, SenseError> {
        let store = Arc::new(TomlConfigStore::new()?);
        let config = store.load()?;

        let level = options
            .log_level_override
            .clone()
            .unwrap_or_else(|| config.logging.level.clone());
        let log_guard = init_logging(&store.logs_dir(), &level, config.logging.file_logging)?;

        info!("Initializing SenseBridge...");

        let detector = SystemHardwareDetector::new(store.home_dir());
        let profile = detector.detect()?;
        info!(capabilities = %profile.summary(), "Hardware capabilities");

        setup::prepare_workspace(&WorkspacePaths::from_store(store.as_ref()))?;

        let simulation = options.simulation;
        if simulation {
            info!("Running in simulation mode");
        }

        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let shell = create_app(
            !options.headless,
            &profile,
            &config.ui,
            shutdown_tx.clone(),
        );

        let capture = if profile.has_audio {
            Some(Arc::new(CpalAudioCapture::new(CaptureConfig::from(
                &config.audio,
            ))?))
        } else {
            warn!("Audio not available, sound recognition and speech-to-text disabled");
            None
        };

        let classifier = if config.classification.enabled && capture.is_some() {
            Some(Arc::new(SpectralClassifier::from_embedded(
                &config.classification,
            )?))
        } else {
            None
        };

        let recognizer = if config.speech.enabled && capture.is_some() && !simulation {
            Some(Arc::new(WhisperRecognizer::new(&config.speech)))
        } else {
            None
        };

        let wearable: Arc<dyn Wearable> = if simulation || config.wearable.address.is_none() {
            if !simulation {
                info!("No wearable address configured, using simulated wearable");
            }
            Arc::new(SimulatedWearable::new())
        } else {
            Arc::new(SocketWearable::new(config.wearable.clone()))
        };

        let notifications = NotificationManager::new(
            Arc::new(EventCatalog::embedded()?),
            config.notifications.clone(),
            Arc::clone(&wearable),
        );

        info!("SenseBridge initialized");

        Ok(Self {
            config,
            profile,
            options,
            store,
            shell,
            capture,
            classifier,
            recognizer,
            wearable,
            notifications,
            shutdown_tx,
            shutdown_rx: Some(shutdown_rx),
            tasks: Vec::new(),
            _log_guard: log_guard,
        })
    }

    /// The active hardware profile.
    pub fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    /// Whether the dashboard is active.
    pub fn uses_gui(&self) -> bool {
        self.shell.uses_gui()
    }

    /// Start every component and run until shutdown.
    pub async fn run(mut self) -> Result<(), SenseError> {
        info!("Starting SenseBridge...");

        self.ensure_model().await;

        if let Err(e) = self.wearable.start().await {
            warn!(error = %e, "Wearable link unavailable");
        }

        if let Some(capture) = &self.capture {
            match capture.list_input_devices() {
                Ok(devices) => {
                    let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
                    info!(?names, "Available microphones");
                }
                Err(e) => warn!(error = %e, "Could not enumerate microphones"),
            }

            if let Err(e) = capture.start().await {
                warn!(error = %e, "Ambient capture failed to start");
            }
        }

        let (detection_tx, mut detection_rx) = mpsc::channel::<Detection>(32);
        let (transcript_tx, mut transcript_rx) = mpsc::channel::<Transcript>(32);

        self.spawn_classification(detection_tx);
        self.spawn_speech(transcript_tx).await;
        self.spawn_audio_event_log();

        // The original ran timeouts on a timer thread; here the timer just
        // feeds the shutdown channel.
        if let Some(timeout) = self.options.timeout {
            let tx = self.shutdown_tx.clone();
            self.tasks.push(tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                info!(secs = timeout.as_secs_f64(), "Timeout reached");
                let _ = tx.send(());
            }));
        }

        self.shell.show_notification("SenseBridge is ready!", None);
        self.shell.update_status_message("System active");
        info!("SenseBridge started");

        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| SenseError::Config("Application already ran".to_string()))?;

        loop {
            tokio::select! {
                Some(detection) = detection_rx.recv() => {
                    self.on_sound_detected(detection).await;
                }
                Some(transcript) = transcript_rx.recv() => {
                    self.on_speech_recognized(transcript).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt, shutting down...");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Fetch the pretrained audio-event model if it is not present yet.
    /// Failure is tolerated; classification degrades to the spectral path.
    async fn ensure_model(&self) {
        let fetcher = match ReqwestFetcher::new() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "HTTP client unavailable, skipping model fetch");
                return;
            }
        };

        let model_fetcher = ModelFetcher::new(Arc::new(fetcher), self.store.models_dir());
        match model_fetcher.ensure(&ModelArtifact::yamnet()).await {
            Ok(status) if status.is_usable() => {
                info!("Audio-event model present");
            }
            Ok(_) => {
                info!("Audio-event model unavailable, using fallback classification");
            }
            Err(e) => {
                warn!(error = %e, "Model fetch failed, using fallback classification");
            }
        }
    }

    fn spawn_classification(&mut self, detection_tx: mpsc::Sender<Detection>) {
        let (capture, classifier) = match (&self.capture, &self.classifier) {
            (Some(capture), Some(classifier)) => (Arc::clone(capture), Arc::clone(classifier)),
            _ => return,
        };

        let mut frames = capture.subscribe();
        self.tasks.push(tokio::spawn(async move {
            loop {
                match frames.recv().await {
                    Ok(frame) => {
                        if let Some(detection) = classifier.classify(&frame) {
                            if detection_tx.send(detection).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Classifier lagging behind capture");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    async fn spawn_speech(&mut self, transcript_tx: mpsc::Sender<Transcript>) {
        if self.options.simulation {
            let simulated = SimulatedSpeech::new(self.config.speech.simulation_interval_secs);
            self.tasks.push(simulated.spawn(transcript_tx));
            return;
        }

        let (capture, recognizer) = match (&self.capture, &self.recognizer) {
            (Some(capture), Some(recognizer)) => (Arc::clone(capture), Arc::clone(recognizer)),
            _ => return,
        };

        let model_path = self.speech_model_path();
        if let Err(e) = recognizer.load_model(&model_path).await {
            warn!(
                path = %model_path.display(),
                error = %e,
                "Speech model not loaded, speech recognition disabled"
            );
            return;
        }

        let mut frames = capture.subscribe();
        let mut segmenter = SegmentBuilder::new(SegmenterConfig::from(&self.config.speech));
        self.tasks.push(tokio::spawn(async move {
            loop {
                match frames.recv().await {
                    Ok(frame) => {
                        let segment = match segmenter.push(&frame) {
                            Some(segment) => segment,
                            None => continue,
                        };
                        match recognizer.transcribe(&segment).await {
                            Ok(transcript) if !transcript.text.is_empty() => {
                                if transcript_tx.send(transcript).await.is_err() {
                                    break;
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!(error = %e, "Transcription failed"),
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Speech pipeline lagging behind capture");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Surface capture lifecycle events (device loss in particular) in the
    /// log; the pipeline itself keeps running and picks audio back up when
    /// capture recovers.
    fn spawn_audio_event_log(&mut self) {
        let capture = match &self.capture {
            Some(capture) => Arc::clone(capture),
            None => return,
        };

        let mut events = capture.subscribe_events();
        self.tasks.push(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AudioEvent::DeviceLost { device_name }) => {
                        warn!(device = %device_name, "Audio input device lost");
                    }
                    Ok(AudioEvent::StateChanged { from, to }) => {
                        info!(?from, ?to, "Capture state changed");
                    }
                    Ok(AudioEvent::Error { message }) => {
                        warn!(message = %message, "Capture error");
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    fn speech_model_path(&self) -> PathBuf {
        let models_root = self.store.home_dir().join("models");
        match &self.config.speech.model_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => models_root.join(path),
            None => models_root.join(DEFAULT_SPEECH_MODEL),
        }
    }

    async fn on_sound_detected(&self, detection: Detection) {
        info!(
            event = %detection.event_id,
            confidence = detection.confidence,
            "Sound detected"
        );

        let delivery = self.notifications.notify_sound(&detection).await;
        if delivery == Delivery::none() {
            return;
        }

        let message = if self.config.ui.show_confidence {
            format!(
                "Detected: {} ({:.2})",
                detection.display_name, detection.confidence
            )
        } else {
            format!("Detected: {}", detection.display_name)
        };
        self.shell
            .show_notification(&message, Some(&detection.event_id));
        self.shell.update_status_message(&format!(
            "Last event: {} ({:.2})",
            detection.event_id, detection.confidence
        ));
    }

    async fn on_speech_recognized(&self, transcript: Transcript) {
        if transcript.text.is_empty() {
            return;
        }

        info!(text = %transcript.text, "Speech recognized");
        self.notifications.notify_speech(&transcript).await;
        self.shell.update_speech_text(&transcript.text);
    }

    /// Stop components in reverse start order.
    async fn stop(&mut self) {
        info!("Stopping SenseBridge...");

        for task in self.tasks.drain(..) {
            task.abort();
        }

        if let Some(capture) = &self.capture {
            if capture.state().can_stop() {
                if let Err(e) = capture.stop().await {
                    warn!(error = %e, "Capture stop failed");
                }
            }
        }

        self.wearable.stop().await;
        self.shell.shutdown();

        info!("SenseBridge stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Construction is exercised end-to-end against a scratch home directory;
    // `run` needs live audio and a terminal, which unit tests don't have.
    #[test]
    fn new_bootstraps_the_workspace_headless() {
        let dir = tempdir().unwrap();
        std::env::set_var(crate::adapters::config_store::HOME_ENV, dir.path());

        let app = SenseBridge::new(RunOptions {
            headless: true,
            simulation: true,
            timeout: Some(Duration::from_secs(1)),
            log_level_override: Some("warn".to_string()),
        });
        std::env::remove_var(crate::adapters::config_store::HOME_ENV);

        let app = app.unwrap();
        assert!(!app.uses_gui());
        assert!(dir.path().join("logs").is_dir());
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("temp").is_dir());
        assert!(dir.path().join("models").join("yamnet_model").is_dir());
        assert!(dir.path().join("config.toml").is_file());
    }
}
