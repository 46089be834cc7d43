use serde::{Deserialize, Serialize};

use crate::domain::SenseError;

/// Embedded sound-event catalog JSON.
const CATALOG_JSON: &str = include_str!("../../resources/sound_events.json");

/// Notification priority of a sound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

/// Delivery channels enabled for a sound event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Channels {
    pub haptic: bool,
    pub visual: bool,
}

/// Acoustic features of one analysis window.
///
/// Tonality is the peak normalized autocorrelation in the searched lag range
/// (1.0 for a periodic signal, near 0 for noise); the dominant frequency is
/// derived from the corresponding lag. Crest is the peak-to-RMS ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundFeatures {
    pub rms: f32,
    pub zcr: f32,
    pub crest: f32,
    pub tonality: f32,
    pub dominant_hz: f32,
}

/// Acoustic signature an event is matched against.
///
/// Every populated field is a soft gate: a feature inside the bound scores
/// 1.0 and falls off linearly with the size of the violation. `min_rms` is a
/// hard gate. The match confidence is the geometric mean of the gate scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSpec {
    /// Dominant-frequency band in Hz.
    #[serde(default)]
    pub band_hz: Option<[f32; 2]>,
    #[serde(default)]
    pub min_tonality: Option<f32>,
    #[serde(default)]
    pub max_tonality: Option<f32>,
    #[serde(default)]
    pub min_crest: Option<f32>,
    #[serde(default)]
    pub max_crest: Option<f32>,
    #[serde(default)]
    pub max_zcr: Option<f32>,
    /// Windows quieter than this never match.
    pub min_rms: f32,
}

impl SignatureSpec {
    /// Score features against this signature, in 0.0-1.0.
    pub fn score(&self, f: &SoundFeatures) -> f32 {
        if f.rms < self.min_rms {
            return 0.0;
        }

        let mut gates: Vec<f32> = Vec::with_capacity(6);

        if let Some([lo, hi]) = self.band_hz {
            let width = (hi - lo).max(1.0);
            let gate = if f.dominant_hz >= lo && f.dominant_hz <= hi {
                1.0
            } else {
                let dist = if f.dominant_hz < lo {
                    lo - f.dominant_hz
                } else {
                    f.dominant_hz - hi
                };
                (1.0 - 2.0 * dist / width).max(0.0)
            };
            gates.push(gate);
        }
        if let Some(m) = self.min_tonality {
            gates.push(Self::at_least(f.tonality, m));
        }
        if let Some(m) = self.max_tonality {
            gates.push(Self::at_most(f.tonality, m));
        }
        if let Some(m) = self.min_crest {
            gates.push(Self::at_least(f.crest, m));
        }
        if let Some(m) = self.max_crest {
            gates.push(Self::at_most(f.crest, m));
        }
        if let Some(m) = self.max_zcr {
            gates.push(Self::at_most(f.zcr, m));
        }

        if gates.is_empty() {
            return 0.0;
        }

        // Geometric mean, so one failed gate zeroes the match.
        let product: f32 = gates.iter().product();
        if product <= 0.0 {
            0.0
        } else {
            product.powf(1.0 / gates.len() as f32)
        }
    }

    fn at_least(value: f32, bound: f32) -> f32 {
        if value >= bound {
            1.0
        } else if bound > 0.0 {
            (1.0 - (bound - value) / bound).max(0.0)
        } else {
            1.0
        }
    }

    fn at_most(value: f32, bound: f32) -> f32 {
        if value <= bound {
            1.0
        } else if bound > 0.0 {
            (1.0 - (value - bound) / bound).max(0.0)
        } else {
            0.0
        }
    }
}

/// One entry of the sound-event catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundEventSpec {
    /// Stable identifier (e.g. "doorbell").
    pub id: String,
    /// Human-readable name for display.
    pub display_name: String,
    pub priority: Priority,
    /// Detections below this confidence are dropped.
    pub min_confidence: f32,
    /// Minimum seconds between notifications for this event.
    pub cooldown_secs: u64,
    pub channels: Channels,
    /// Acoustic signature; absent for events that are not produced by the
    /// classifier (speech comes from the recognizer).
    #[serde(default)]
    pub signature: Option<SignatureSpec>,
}

/// Catalog of recognizable sound events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCatalog {
    /// Catalog version for compatibility checking.
    pub version: u32,
    pub events: Vec<SoundEventSpec>,
}

impl EventCatalog {
    /// Parse the catalog embedded in the binary.
    pub fn embedded() -> Result<Self, SenseError> {
        serde_json::from_str(CATALOG_JSON)
            .map_err(|e| SenseError::Catalog(format!("Failed to parse sound event catalog: {}", e)))
    }

    /// Find an event by ID.
    pub fn get(&self, event_id: &str) -> Option<&SoundEventSpec> {
        self.events.iter().find(|e| e.id == event_id)
    }

    /// Events the classifier can match (those carrying a signature).
    pub fn classifiable(&self) -> impl Iterator<Item = &SoundEventSpec> {
        self.events.iter().filter(|e| e.signature.is_some())
    }
}

/// A classified sound event.
#[derive(Debug, Clone)]
pub struct Detection {
    pub event_id: String,
    pub display_name: String,
    pub confidence: f32,
    pub features: SoundFeatures,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(rms: f32, zcr: f32, crest: f32, tonality: f32, dominant_hz: f32) -> SoundFeatures {
        SoundFeatures {
            rms,
            zcr,
            crest,
            tonality,
            dominant_hz,
        }
    }

    #[test]
    fn embedded_catalog_parses() {
        let catalog = EventCatalog::embedded().unwrap();
        assert!(catalog.version >= 1);
        assert!(catalog.get("doorbell").is_some());
        assert!(catalog.get("speech").is_some());
        // Speech is not classifiable; the acoustic events are.
        assert!(catalog.get("speech").unwrap().signature.is_none());
        assert!(catalog.classifiable().count() >= 4);
    }

    #[test]
    fn quiet_windows_never_match() {
        let catalog = EventCatalog::embedded().unwrap();
        let doorbell = catalog.get("doorbell").unwrap().signature.as_ref().unwrap();
        let quiet = features(0.001, 0.06, 1.5, 0.99, 110.0);
        assert_eq!(doorbell.score(&quiet), 0.0);
    }

    #[test]
    fn tonal_midband_matches_doorbell_not_knock() {
        let catalog = EventCatalog::embedded().unwrap();
        let two_tone = features(0.4, 0.06, 1.6, 0.98, 110.0);

        let doorbell = catalog.get("doorbell").unwrap().signature.as_ref().unwrap();
        let knock = catalog.get("knock").unwrap().signature.as_ref().unwrap();

        assert!(doorbell.score(&two_tone) > 0.9);
        assert_eq!(knock.score(&two_tone), 0.0);
    }

    #[test]
    fn impulsive_broadband_matches_knock() {
        let catalog = EventCatalog::embedded().unwrap();
        let bursts = features(0.12, 0.08, 8.5, 0.05, 900.0);

        let knock = catalog.get("knock").unwrap().signature.as_ref().unwrap();
        let doorbell = catalog.get("doorbell").unwrap().signature.as_ref().unwrap();

        assert!(knock.score(&bursts) > 0.9);
        assert!(doorbell.score(&bursts) < 0.5);
    }

    #[test]
    fn sustained_noise_is_rejected_by_zcr_gate() {
        let catalog = EventCatalog::embedded().unwrap();
        let knock = catalog.get("knock").unwrap().signature.as_ref().unwrap();

        // A fan or running water: noisy and moderately crested, but the
        // crossings are dense across the whole window.
        let steady_noise = features(0.2, 0.5, 4.4, 0.05, 1800.0);
        assert_eq!(knock.score(&steady_noise), 0.0);
    }

    #[test]
    fn high_band_tone_prefers_microwave_over_alarm() {
        let catalog = EventCatalog::embedded().unwrap();
        let beep = features(0.27, 0.25, 2.6, 0.96, 2000.0);

        let microwave = catalog
            .get("microwave_beep")
            .unwrap()
            .signature
            .as_ref()
            .unwrap();
        let alarm = catalog.get("alarm").unwrap().signature.as_ref().unwrap();

        let mw = microwave.score(&beep);
        let al = alarm.score(&beep);
        assert!(mw > 0.9);
        assert!(al < mw);
        assert!(al < catalog.get("alarm").unwrap().min_confidence);
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }
}
