use zeroize::Zeroize;

use crate::domain::audio::AudioFrame;
use crate::domain::config::SpeechSection;

/// A contiguous run of speech audio awaiting transcription.
/// Cleared from memory after use; speech never touches disk.
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct SpeechSegment {
    /// PCM audio samples (16-bit mono).
    samples: Vec<i16>,
    /// Sample rate in Hz.
    sample_rate: u32,
}

impl SpeechSegment {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// A recognized utterance.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    /// Detected language (ISO 639-1 code), when the backend reports one.
    pub language: Option<String>,
    /// Recognition wall time in milliseconds.
    pub duration_ms: u64,
}

/// Energy-gate segmenter settings.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// A window opens a segment when its RMS reaches this level.
    pub energy_threshold: f32,
    /// Quiet time that closes an open segment, in milliseconds.
    pub pause_ms: u64,
    /// Hard upper bound on segment length, in milliseconds.
    pub phrase_limit_ms: u64,
}

impl From<&SpeechSection> for SegmenterConfig {
    fn from(section: &SpeechSection) -> Self {
        Self {
            energy_threshold: section.energy_threshold,
            pause_ms: section.pause_ms,
            phrase_limit_ms: section.phrase_limit_ms,
        }
    }
}

/// Accumulates capture windows into speech segments with an energy gate.
///
/// A segment opens on the first window at or above the energy threshold and
/// closes after `pause_ms` of quiet or at `phrase_limit_ms`, whichever comes
/// first. Quiet windows between loud ones stay in the segment so short pauses
/// inside an utterance are preserved.
pub struct SegmentBuilder {
    config: SegmenterConfig,
    buf: Vec<i16>,
    sample_rate: u32,
    collected_ms: u64,
    quiet_ms: u64,
    active: bool,
}

impl SegmentBuilder {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            buf: Vec::new(),
            sample_rate: 0,
            collected_ms: 0,
            quiet_ms: 0,
            active: false,
        }
    }

    /// Feed one capture window; returns a finished segment when one closes.
    pub fn push(&mut self, frame: &AudioFrame) -> Option<SpeechSegment> {
        if !self.active {
            if frame.rms < self.config.energy_threshold {
                return None;
            }
            self.active = true;
            self.sample_rate = frame.sample_rate;
            self.quiet_ms = 0;
            self.collected_ms = 0;
        }

        self.buf.extend_from_slice(&frame.samples);
        self.collected_ms += frame.duration_ms();

        if frame.rms < self.config.energy_threshold {
            self.quiet_ms += frame.duration_ms();
        } else {
            self.quiet_ms = 0;
        }

        if self.quiet_ms >= self.config.pause_ms
            || self.collected_ms >= self.config.phrase_limit_ms
        {
            return Some(self.finish());
        }
        None
    }

    /// Close and return any open segment.
    pub fn flush(&mut self) -> Option<SpeechSegment> {
        if self.active && !self.buf.is_empty() {
            Some(self.finish())
        } else {
            None
        }
    }

    fn finish(&mut self) -> SpeechSegment {
        self.active = false;
        self.quiet_ms = 0;
        self.collected_ms = 0;
        SpeechSegment::new(std::mem::take(&mut self.buf), self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SegmenterConfig {
        SegmenterConfig {
            energy_threshold: 0.02,
            pause_ms: 800,
            phrase_limit_ms: 5_000,
        }
    }

    fn frame(rms_loud: bool) -> AudioFrame {
        // 975ms at 16kHz; a constant amplitude gives a predictable RMS.
        let amp: i16 = if rms_loud { 3_000 } else { 0 };
        AudioFrame::new(vec![amp; 15_600], 16_000)
    }

    #[test]
    fn quiet_windows_never_open_a_segment() {
        let mut builder = SegmentBuilder::new(config());
        for _ in 0..10 {
            assert!(builder.push(&frame(false)).is_none());
        }
        assert!(builder.flush().is_none());
    }

    #[test]
    fn pause_closes_a_segment() {
        let mut builder = SegmentBuilder::new(config());

        assert!(builder.push(&frame(true)).is_none());
        assert!(builder.push(&frame(true)).is_none());

        // One quiet window is 975ms, past the 800ms pause threshold.
        let segment = builder.push(&frame(false)).expect("segment should close");
        assert_eq!(segment.len(), 3 * 15_600);
        assert_eq!(segment.sample_rate(), 16_000);
    }

    #[test]
    fn phrase_limit_closes_a_long_segment() {
        let mut builder = SegmentBuilder::new(config());

        let mut segment = None;
        for _ in 0..6 {
            segment = builder.push(&frame(true));
            if segment.is_some() {
                break;
            }
        }
        // 6 windows * 975ms = 5850ms crosses the 5000ms limit; the sixth
        // push must close the segment.
        let segment = segment.expect("segment should close at the limit");
        assert_eq!(segment.len(), 6 * 15_600);
    }

    #[test]
    fn flush_returns_the_open_segment() {
        let mut builder = SegmentBuilder::new(config());
        assert!(builder.push(&frame(true)).is_none());

        let segment = builder.flush().expect("open segment");
        assert_eq!(segment.len(), 15_600);
        assert!(builder.flush().is_none());
    }

    #[test]
    fn segment_duration() {
        let segment = SpeechSegment::new(vec![0i16; 16_000], 16_000);
        assert!((segment.duration_secs() - 1.0).abs() < 0.001);
    }
}
