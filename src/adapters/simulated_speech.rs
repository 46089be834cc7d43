use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::Transcript;

/// Phrases emitted by the simulated recognizer, in rotation.
const TEST_PHRASES: [&str; 4] = [
    "Help me",
    "What was that noise",
    "Turn on the lights",
    "Call for help",
];

/// Simulated speech source for running without a microphone or model.
///
/// Emits a fixed rotation of phrases on a timer, standing in for the whole
/// capture-segment-transcribe pipeline in simulation mode.
pub struct SimulatedSpeech {
    interval: Duration,
}

impl SimulatedSpeech {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Spawn the phrase loop; transcripts arrive on the given channel.
    /// The task ends when the receiver is dropped.
    pub fn spawn(&self, tx: mpsc::Sender<Transcript>) -> JoinHandle<()> {
        let interval = self.interval;
        info!(interval_secs = interval.as_secs(), "Simulated speech started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so phrases arrive
            // spaced from startup.
            ticker.tick().await;

            let mut index = 0usize;
            loop {
                ticker.tick().await;
                let phrase = TEST_PHRASES[index % TEST_PHRASES.len()];
                index += 1;

                debug!(phrase, "Simulated phrase");
                let transcript = Transcript {
                    text: phrase.to_string(),
                    language: Some("en".to_string()),
                    duration_ms: 0,
                };
                if tx.send(transcript).await.is_err() {
                    break;
                }
            }
            debug!("Simulated speech stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn phrases_rotate_on_the_timer() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = SimulatedSpeech::new(5).spawn(tx);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.text, "Help me");
        assert_eq!(second.text, "What was that noise");

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn task_ends_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        let handle = SimulatedSpeech::new(1).spawn(tx);
        drop(rx);

        // The next send fails and the loop exits.
        let result = tokio::time::timeout(Duration::from_secs(10), handle).await;
        assert!(result.is_ok());
    }
}
