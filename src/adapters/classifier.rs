use tracing::{debug, trace};

use crate::domain::config::ClassificationSection;
use crate::domain::{AudioFrame, Detection, EventCatalog, SenseError, SoundFeatures};
use crate::ports::SoundClassifier;

/// Autocorrelation search range, expressed as frequencies.
const MAX_FREQ_HZ: u32 = 2_000;
const MIN_FREQ_HZ: u32 = 80;

/// Catalog-driven spectral classifier.
///
/// Extracts level, crest, zero-crossing, and autocorrelation features from
/// one analysis window and scores them against each catalog signature. This
/// is the classification path that runs when the pretrained model artifact
/// is absent or unusable, which the setup flow explicitly tolerates.
pub struct SpectralClassifier {
    catalog: EventCatalog,
    energy_floor: f32,
}

impl SpectralClassifier {
    pub fn new(catalog: EventCatalog, energy_floor: f32) -> Self {
        Self {
            catalog,
            energy_floor,
        }
    }

    /// Build a classifier from the embedded catalog.
    pub fn from_embedded(config: &ClassificationSection) -> Result<Self, SenseError> {
        Ok(Self::new(EventCatalog::embedded()?, config.energy_floor))
    }

    /// Extract acoustic features from one window of 16-bit samples.
    pub fn extract_features(samples: &[i16], sample_rate: u32) -> SoundFeatures {
        if samples.is_empty() || sample_rate == 0 {
            return SoundFeatures {
                rms: 0.0,
                zcr: 0.0,
                crest: 0.0,
                tonality: 0.0,
                dominant_hz: 0.0,
            };
        }

        let x: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

        let energy: f64 = x.iter().map(|&v| (v as f64) * (v as f64)).sum();
        let rms = (energy / x.len() as f64).sqrt() as f32;
        let peak = x.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
        let crest = if rms > 0.0 { peak / rms } else { 0.0 };

        let crossings = x
            .windows(2)
            .filter(|pair| pair[0] * pair[1] < 0.0)
            .count();
        let zcr = crossings as f32 / (x.len() - 1).max(1) as f32;

        let (tonality, dominant_hz) = Self::periodicity(&x, energy, sample_rate);

        SoundFeatures {
            rms,
            zcr,
            crest,
            tonality,
            dominant_hz,
        }
    }

    /// Peak normalized autocorrelation over the searched lag range, and the
    /// frequency of the smallest lag near that peak.
    ///
    /// Picking the smallest qualifying lag keeps a harmonic stack from
    /// reporting a subharmonic while still letting a two-tone chime resolve
    /// to its common fundamental.
    fn periodicity(x: &[f32], energy: f64, sample_rate: u32) -> (f32, f32) {
        if energy <= f64::EPSILON {
            return (0.0, 0.0);
        }

        let lag_min = (sample_rate / MAX_FREQ_HZ).max(1) as usize;
        let lag_max = ((sample_rate / MIN_FREQ_HZ) as usize).min(x.len().saturating_sub(1));
        if lag_min >= lag_max {
            return (0.0, 0.0);
        }

        let mut correlations = Vec::with_capacity(lag_max - lag_min + 1);
        let mut best = 0.0f32;
        for lag in lag_min..=lag_max {
            let sum: f64 = x[..x.len() - lag]
                .iter()
                .zip(&x[lag..])
                .map(|(&a, &b)| (a as f64) * (b as f64))
                .sum();
            let r = (sum / energy) as f32;
            correlations.push(r);
            if r > best {
                best = r;
            }
        }

        if best <= 0.0 {
            return (0.0, 0.0);
        }

        let threshold = 0.95 * best;
        let picked = correlations
            .iter()
            .position(|&r| r >= threshold)
            .map(|i| i + lag_min)
            .unwrap_or(lag_max);

        (best.min(1.0), sample_rate as f32 / picked as f32)
    }
}

impl SoundClassifier for SpectralClassifier {
    fn classify(&self, frame: &AudioFrame) -> Option<Detection> {
        if frame.rms < self.energy_floor {
            trace!(rms = frame.rms, "Window below energy floor");
            return None;
        }

        let features = Self::extract_features(&frame.samples, frame.sample_rate);

        let mut best: Option<(&str, &str, f32)> = None;
        for spec in self.catalog.classifiable() {
            let signature = match spec.signature.as_ref() {
                Some(s) => s,
                None => continue,
            };
            let confidence = signature.score(&features);
            if confidence < spec.min_confidence {
                continue;
            }
            if best.map_or(true, |(_, _, c)| confidence > c) {
                best = Some((spec.id.as_str(), spec.display_name.as_str(), confidence));
            }
        }

        let (event_id, display_name, confidence) = best?;
        debug!(
            event = event_id,
            confidence,
            dominant_hz = features.dominant_hz,
            tonality = features.tonality,
            "Sound classified"
        );
        Some(Detection {
            event_id: event_id.to_string(),
            display_name: display_name.to_string(),
            confidence,
            features,
        })
    }

    fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SR: u32 = 16_000;
    const WINDOW: usize = 15_600;

    fn classifier() -> SpectralClassifier {
        SpectralClassifier::from_embedded(&ClassificationSection::default()).unwrap()
    }

    fn to_frame(samples: Vec<f32>) -> AudioFrame {
        let pcm: Vec<i16> = samples
            .iter()
            .map(|&v| (v.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();
        AudioFrame::new(pcm, SR)
    }

    /// Deterministic uniform noise in [-1, 1] without a rand dependency.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> f32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 32) as f32 / (1u64 << 31) as f32 - 1.0
        }
    }

    fn doorbell_chime() -> Vec<f32> {
        // Two-tone chime; the shared fundamental sits near 110Hz.
        (0..WINDOW)
            .map(|n| {
                let t = n as f32 / SR as f32;
                0.4 * (TAU * 440.0 * t).sin() + 0.4 * (TAU * 550.0 * t).sin()
            })
            .collect()
    }

    fn knock_bursts() -> Vec<f32> {
        let mut samples = vec![0.0f32; WINDOW];
        let mut noise = Lcg(17);
        for start_secs in [0.1f32, 0.3, 0.5] {
            let start = (start_secs * SR as f32) as usize;
            for sample in samples.iter_mut().skip(start).take(800) {
                *sample = 0.6 * noise.next();
            }
        }
        samples
    }

    fn alarm_tone() -> Vec<f32> {
        (0..WINDOW)
            .map(|n| 0.8 * (TAU * 1000.0 * n as f32 / SR as f32).sin())
            .collect()
    }

    fn microwave_beeps() -> Vec<f32> {
        let mut samples = vec![0.0f32; WINDOW];
        for start_secs in [0.1f32, 0.4, 0.7] {
            let start = (start_secs * SR as f32) as usize;
            for (i, sample) in samples.iter_mut().skip(start).take(1600).enumerate() {
                *sample = 0.7 * (TAU * 2000.0 * i as f32 / SR as f32).sin();
            }
        }
        samples
    }

    #[test]
    fn features_of_a_pure_tone() {
        let frame = to_frame(alarm_tone());
        let f = SpectralClassifier::extract_features(&frame.samples, SR);

        assert!((f.rms - 0.566).abs() < 0.02);
        assert!(f.tonality > 0.9);
        assert!((f.dominant_hz - 1000.0).abs() < 80.0);
        assert!(f.crest < 2.0);
    }

    #[test]
    fn features_of_silence() {
        let f = SpectralClassifier::extract_features(&vec![0i16; WINDOW], SR);
        assert_eq!(f.rms, 0.0);
        assert_eq!(f.tonality, 0.0);
        assert_eq!(f.dominant_hz, 0.0);
    }

    #[test]
    fn chime_resolves_to_its_fundamental() {
        let frame = to_frame(doorbell_chime());
        let f = SpectralClassifier::extract_features(&frame.samples, SR);

        assert!(f.tonality > 0.9);
        assert!(f.dominant_hz > 100.0 && f.dominant_hz < 125.0);
    }

    #[test]
    fn classifies_doorbell() {
        let det = classifier()
            .classify(&to_frame(doorbell_chime()))
            .expect("chime should classify");
        assert_eq!(det.event_id, "doorbell");
        assert!(det.confidence > 0.55);
    }

    #[test]
    fn classifies_knock() {
        let det = classifier()
            .classify(&to_frame(knock_bursts()))
            .expect("bursts should classify");
        assert_eq!(det.event_id, "knock");
    }

    #[test]
    fn classifies_alarm() {
        let det = classifier()
            .classify(&to_frame(alarm_tone()))
            .expect("tone should classify");
        assert_eq!(det.event_id, "alarm");
        assert!(det.confidence > 0.65);
    }

    #[test]
    fn classifies_microwave_beep() {
        let det = classifier()
            .classify(&to_frame(microwave_beeps()))
            .expect("beeps should classify");
        assert_eq!(det.event_id, "microwave_beep");
    }

    #[test]
    fn silence_produces_no_event() {
        assert!(classifier().classify(&AudioFrame::new(vec![0i16; WINDOW], SR)).is_none());
    }

    #[test]
    fn faint_sound_stays_below_the_floor() {
        let faint: Vec<f32> = (0..WINDOW)
            .map(|n| 0.005 * (TAU * 500.0 * n as f32 / SR as f32).sin())
            .collect();
        assert!(classifier().classify(&to_frame(faint)).is_none());
    }
}
