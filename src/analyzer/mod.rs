//! Metric extraction
//!
//! Turns an [`AudioBuffer`] into five 0-100 scores. Every score is a fixed
//! DSP measurement, so the same buffer always yields the same numbers.
//!
//! ```text
//! Axis        | Measures                 | Frames used | 100 means
//! ------------|--------------------------|-------------|------------------------------
//! stability   | pitch jitter (semitones) | voiced      | no frame-to-frame pitch wobble
//! clarity     | harmonics-to-noise ratio | voiced      | HNR of 30 dB or more
//! resonance   | F1/F2 level balance      | voiced      | both formants equally strong
//! brightness  | spectral centroid        | active      | centroid at 4 kHz or above
//! power       | level and steadiness     | active      | -12 dBFS or louder, steady
//! ```
//!
//! # Frames
//!
//! The buffer is cut into overlapping frames (25 ms every 10 ms by default).
//! A frame is **active** when its RMS level reaches the silence threshold and
//! **voiced** when it is also periodic enough (peak normalized
//! autocorrelation at or above the voicing threshold). Silent frames never
//! enter the pitch, clarity or formant computations.
//!
//! # Confidence
//!
//! | Situation                          | Result                                  |
//! |------------------------------------|-----------------------------------------|
//! | shorter than one frame             | all scores undefined, confidence low    |
//! | no voiced frame                    | `Error::InsufficientAudio`              |
//! | voiced audio below `min_voiced_ms` | voice scores undefined, confidence low  |
//! | more than 90% of frames silent     | confidence low                          |

pub mod formant;
pub mod pitch;
pub mod spectral;

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::loader::AudioBuffer;
use formant::FormantPair;
use pitch::{PitchEstimate, PitchRange};
use serde::{Deserialize, Serialize};
use spectral::CentroidAnalyzer;
use std::fmt;

/// Silence ratio above which results are flagged low-confidence
pub const MAX_SILENCE_RATIO: f64 = 0.9;

/// HNR mapped to a clarity score of 100 (dB)
pub const CLARITY_CEIL_DB: f64 = 30.0;

/// Level mapped to a power score of 100 (dBFS)
pub const POWER_CEIL_DB: f64 = -12.0;

/// Mean level change (dB) at which steadiness falls to 1/e
pub const STEADINESS_SCALE_DB: f64 = 6.0;

/// RMS pitch change (semitones) at which stability falls to 1/e
pub const JITTER_SCALE_SEMITONES: f64 = 1.0;

/// One of the five scored dimensions, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Stability,
    Clarity,
    Resonance,
    Brightness,
    Power,
}

impl Axis {
    pub const ALL: [Axis; 5] = [
        Axis::Stability,
        Axis::Clarity,
        Axis::Resonance,
        Axis::Brightness,
        Axis::Power,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Axis::Stability => "stability",
            Axis::Clarity => "clarity",
            Axis::Resonance => "resonance",
            Axis::Brightness => "brightness",
            Axis::Power => "power",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Normal,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Confidence::Normal => "normal",
            Confidence::Low => "low",
        })
    }
}

/// The five scores; `None` means the axis could not be measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub stability: Option<f64>,
    pub clarity: Option<f64>,
    pub resonance: Option<f64>,
    pub brightness: Option<f64>,
    pub power: Option<f64>,
}

impl Scores {
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Stability => self.stability,
            Axis::Clarity => self.clarity,
            Axis::Resonance => self.resonance,
            Axis::Brightness => self.brightness,
            Axis::Power => self.power,
        }
    }

    /// (axis, score) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Axis, Option<f64>)> + '_ {
        Axis::ALL.iter().map(move |&axis| (axis, self.get(axis)))
    }

    pub fn defined_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Intermediate measurements behind the scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDetails {
    pub frame_count: usize,
    pub active_frames: usize,
    pub voiced_frames: usize,
    pub voiced_ms: f64,
    /// Inactive frames / total frames
    pub silence_ratio: f64,
    pub mean_f0_hz: Option<f64>,
    /// RMS frame-to-frame pitch change
    pub jitter_semitones: Option<f64>,
    pub mean_hnr_db: Option<f64>,
    pub mean_f1_hz: Option<f64>,
    pub mean_f2_hz: Option<f64>,
    pub mean_centroid_hz: Option<f64>,
    pub mean_level_db: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub scores: Scores,
    pub confidence: Confidence,
    pub details: MetricDetails,
}

impl MetricSet {
    pub fn score(&self, axis: Axis) -> Option<f64> {
        self.scores.get(axis)
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::Low
    }
}

/// Per-frame measurements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameStats {
    pub index: usize,
    pub start_secs: f64,
    pub level_db: f64,
    pub active: bool,
    pub voiced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<PitchEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formants: Option<FormantPair>,
}

/// Computes a [`MetricSet`] from a buffer
#[derive(Debug, Clone, Default)]
pub struct MetricExtractor {
    config: AnalysisConfig,
}

impl MetricExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Frame length in samples at `sample_rate`
    pub fn frame_len(&self, sample_rate: u32) -> usize {
        ms_to_samples(self.config.frame_ms, sample_rate)
    }

    /// Hop length in samples at `sample_rate`
    pub fn hop_len(&self, sample_rate: u32) -> usize {
        ms_to_samples(self.config.hop_ms, sample_rate)
    }

    fn lpc_order(&self, sample_rate: u32) -> usize {
        if self.config.lpc_order == 0 {
            formant::default_order(sample_rate)
        } else {
            self.config.lpc_order
        }
    }

    /// Measure every frame of the buffer. Empty when the buffer is shorter
    /// than one frame.
    pub fn frames(&self, buffer: &AudioBuffer) -> Vec<FrameStats> {
        let sr = buffer.sample_rate();
        let samples: Vec<f64> = buffer.samples().iter().map(|&s| s as f64).collect();
        let frame_len = self.frame_len(sr);
        let hop_len = self.hop_len(sr);

        if samples.len() < frame_len {
            return Vec::new();
        }

        let range = PitchRange::from_hz(self.config.min_pitch_hz, self.config.max_pitch_hz, sr);
        let pitch_len = range.window_len(frame_len);
        let order = self.lpc_order(sr);
        let centroids = CentroidAnalyzer::new(frame_len);

        let count = 1 + (samples.len() - frame_len) / hop_len;
        (0..count)
            .map(|index| {
                let start = index * hop_len;
                let frame = &samples[start..start + frame_len];
                let level_db = spectral::to_db(spectral::rms(frame));
                let active = level_db >= self.config.silence_threshold_db;

                let mut stats = FrameStats {
                    index,
                    start_secs: start as f64 / sr as f64,
                    level_db,
                    active,
                    voiced: false,
                    pitch: None,
                    centroid_hz: None,
                    formants: None,
                };

                if !active {
                    return stats;
                }

                let pitch_end = (start + pitch_len).min(samples.len());
                stats.pitch = pitch::estimate(&samples[start..pitch_end], range, sr);
                stats.voiced = stats
                    .pitch
                    .map(|p| p.strength >= self.config.voicing_threshold)
                    .unwrap_or(false);
                stats.centroid_hz = centroids.centroid(frame, sr);
                if stats.voiced {
                    stats.formants = formant::formants(frame, sr, order);
                }
                stats
            })
            .collect()
    }

    /// Compute the metric set for a buffer
    pub fn extract(&self, buffer: &AudioBuffer) -> Result<MetricSet> {
        let frames = self.frames(buffer);

        if frames.is_empty() {
            tracing::warn!(
                "Buffer of {:.3}s is shorter than one {}ms frame; no metrics",
                buffer.duration_secs(),
                self.config.frame_ms
            );
            return Ok(MetricSet {
                scores: Scores::default(),
                confidence: Confidence::Low,
                details: MetricDetails::default(),
            });
        }

        let hop_ms = self.hop_len(buffer.sample_rate()) as f64 * 1000.0 / buffer.sample_rate() as f64;
        let active: Vec<&FrameStats> = frames.iter().filter(|f| f.active).collect();
        let voiced: Vec<&FrameStats> = frames.iter().filter(|f| f.voiced).collect();
        let voiced_ms = voiced.len() as f64 * hop_ms;

        if voiced.is_empty() {
            return Err(Error::InsufficientAudio {
                voiced_ms: 0.0,
                required_ms: self.config.min_voiced_ms,
            });
        }

        let silence_ratio = 1.0 - active.len() as f64 / frames.len() as f64;
        let enough_voice = voiced_ms >= self.config.min_voiced_ms;

        let mut details = MetricDetails {
            frame_count: frames.len(),
            active_frames: active.len(),
            voiced_frames: voiced.len(),
            voiced_ms: round2(voiced_ms),
            silence_ratio: round2(silence_ratio),
            ..Default::default()
        };

        // Pitch stability
        let f0s: Vec<f64> = voiced.iter().filter_map(|f| f.pitch.map(|p| p.f0_hz)).collect();
        details.mean_f0_hz = mean(&f0s).map(round2);
        let steps: Vec<f64> = adjacent_pairs(&frames, |f| f.voiced)
            .filter_map(|(a, b)| Some(pitch::semitones(a.pitch?.f0_hz, b.pitch?.f0_hz)))
            .collect();
        let jitter = rms_or_zero(&steps);
        details.jitter_semitones = Some(round2(jitter));
        let stability = 100.0 * (-jitter / JITTER_SCALE_SEMITONES).exp();

        // Clarity
        let hnrs: Vec<f64> = voiced
            .iter()
            .filter_map(|f| f.pitch.map(|p| pitch::hnr_db(p.strength)))
            .collect();
        let mean_hnr = mean(&hnrs).unwrap_or(0.0);
        details.mean_hnr_db = Some(round2(mean_hnr));
        let clarity = 100.0 * mean_hnr / CLARITY_CEIL_DB;

        // Resonance
        let pairs: Vec<FormantPair> = voiced.iter().filter_map(|f| f.formants).collect();
        details.mean_f1_hz = mean(&pairs.iter().map(|p| p.f1_hz).collect::<Vec<_>>()).map(round2);
        details.mean_f2_hz = mean(&pairs.iter().map(|p| p.f2_hz).collect::<Vec<_>>()).map(round2);
        // Frames without a pair count as 0; no pair anywhere leaves it undefined
        let resonance = if pairs.is_empty() {
            None
        } else {
            let balance_sum: f64 = pairs.iter().map(|p| p.balance_index()).sum();
            Some(balance_sum / voiced.len() as f64)
        };

        // Brightness
        let centroids: Vec<f64> = active.iter().filter_map(|f| f.centroid_hz).collect();
        let mean_centroid = mean(&centroids);
        details.mean_centroid_hz = mean_centroid.map(round2);
        let brightness = mean_centroid.map(spectral::brightness_score);

        // Power
        let levels: Vec<f64> = active.iter().map(|f| f.level_db).collect();
        let mean_level = mean(&levels);
        details.mean_level_db = mean_level.map(round2);
        let level_changes: Vec<f64> = adjacent_pairs(&frames, |f| f.active)
            .map(|(a, b)| (b.level_db - a.level_db).abs())
            .collect();
        let steadiness = (-mean(&level_changes).unwrap_or(0.0) / STEADINESS_SCALE_DB).exp();
        let power = mean_level.map(|level| self.level_score(level) * steadiness);

        let voice_score = |value: Option<f64>| value.filter(|_| enough_voice).map(score);
        let scores = Scores {
            stability: voice_score(Some(stability)),
            clarity: voice_score(Some(clarity)),
            resonance: voice_score(resonance),
            brightness: brightness.map(score),
            power: power.map(score),
        };

        let confidence = if !enough_voice || silence_ratio > MAX_SILENCE_RATIO {
            Confidence::Low
        } else {
            Confidence::Normal
        };

        tracing::debug!(
            "{} frames ({} active, {} voiced, {:.0}ms voiced), f0 {:?} Hz, HNR {:.1} dB",
            details.frame_count,
            details.active_frames,
            details.voiced_frames,
            voiced_ms,
            details.mean_f0_hz,
            mean_hnr
        );
        if confidence == Confidence::Low {
            tracing::warn!(
                "Low confidence: {:.0}ms voiced (need {:.0}ms), {:.0}% silent",
                voiced_ms,
                self.config.min_voiced_ms,
                silence_ratio * 100.0
            );
        }

        Ok(MetricSet {
            scores,
            confidence,
            details,
        })
    }

    /// Silence threshold maps to 0, -12 dBFS to 100
    fn level_score(&self, level_db: f64) -> f64 {
        let floor = self.config.silence_threshold_db;
        if POWER_CEIL_DB <= floor {
            return if level_db >= floor { 100.0 } else { 0.0 };
        }
        100.0 * (level_db - floor) / (POWER_CEIL_DB - floor)
    }
}

fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    ((ms * sample_rate as f64 / 1000.0).round() as usize).max(1)
}

/// Neighbouring frames that both satisfy `keep`
fn adjacent_pairs<'a, F>(
    frames: &'a [FrameStats],
    keep: F,
) -> impl Iterator<Item = (&'a FrameStats, &'a FrameStats)> + 'a
where
    F: Fn(&FrameStats) -> bool + 'a,
{
    frames
        .windows(2)
        .filter(move |w| keep(&w[0]) && keep(&w[1]))
        .map(|w| (&w[0], &w[1]))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn rms_or_zero(values: &[f64]) -> f64 {
    mean(&values.iter().map(|v| v * v).collect::<Vec<_>>())
        .map(f64::sqrt)
        .unwrap_or(0.0)
}

/// Clamp to 0-100 and round to two decimals
fn score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    // + 0.0 turns -0.0 into 0.0
    round2(value.clamp(0.0, 100.0)) + 0.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 16000;

    fn tone(freq: f32, seconds: f32, amp: f32) -> Vec<f32> {
        let n = (SR as f32 * seconds) as usize;
        (0..n)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn buffer(samples: Vec<f32>) -> AudioBuffer {
        AudioBuffer::new(samples, SR, 1).unwrap()
    }

    /// Phase-continuous tone that alternates between two pitches
    fn warble(low: f32, high: f32, segment_secs: f32, seconds: f32) -> Vec<f32> {
        let n = (SR as f32 * seconds) as usize;
        let segment = (SR as f32 * segment_secs) as usize;
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let freq = if (i / segment) % 2 == 0 { low } else { high };
                phase += 2.0 * std::f32::consts::PI * freq / SR as f32;
                0.5 * phase.sin()
            })
            .collect()
    }

    /// Deterministic noise (xorshift)
    fn noise(n: usize, amp: f32) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                amp * ((state as f32 / u32::MAX as f32) * 2.0 - 1.0)
            })
            .collect()
    }

    // ==========================================================================
    // AXES AND SCORES
    // ==========================================================================

    #[test]
    fn test_axis_order_and_names() {
        let names: Vec<&str> = Axis::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["stability", "clarity", "resonance", "brightness", "power"]);
        assert_eq!(Axis::Power.to_string(), "power");
        assert_eq!(serde_json::to_string(&Axis::Clarity).unwrap(), "\"clarity\"");
    }

    #[test]
    fn test_scores_serialize_in_canonical_order() {
        let scores = Scores {
            stability: Some(1.0),
            clarity: None,
            resonance: Some(3.0),
            brightness: Some(4.0),
            power: Some(5.0),
        };
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(
            json,
            r#"{"stability":1.0,"clarity":null,"resonance":3.0,"brightness":4.0,"power":5.0}"#
        );
        assert_eq!(scores.defined_count(), 4);
        assert_eq!(scores.get(Axis::Brightness), Some(4.0));
    }

    #[test]
    fn test_score_clamps_and_rounds() {
        assert_eq!(score(123.4), 100.0);
        assert_eq!(score(-5.0), 0.0);
        assert_eq!(score(42.123456), 42.12);
        assert_eq!(score(f64::NAN), 0.0);
    }

    #[test]
    fn test_score_has_no_negative_zero() {
        assert!(score(-0.0).is_sign_positive());
        assert!(score(-0.001).is_sign_positive());
        assert_eq!(serde_json::to_string(&score(-0.0)).unwrap(), "0.0");
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::Low).unwrap(), "\"low\"");
        assert_eq!(Confidence::Normal.to_string(), "normal");
    }

    // ==========================================================================
    // FRAMING
    // ==========================================================================
    //
    // 1 s at 16 kHz with 400-sample frames every 160 samples:
    // 1 + (16000 - 400) / 160 = 98 frames.
    // ==========================================================================

    #[test]
    fn test_frame_geometry() {
        let extractor = MetricExtractor::default();
        assert_eq!(extractor.frame_len(16000), 400);
        assert_eq!(extractor.hop_len(16000), 160);
        assert_eq!(extractor.frame_len(44100), 1103);

        let frames = extractor.frames(&buffer(tone(220.0, 1.0, 0.5)));
        assert_eq!(frames.len(), 98);
        assert_eq!(frames[1].start_secs, 0.01);
        assert!(frames.iter().all(|f| f.active && f.voiced));
    }

    #[test]
    fn test_silent_frames_skip_pitch_and_formants() {
        let mut samples = tone(220.0, 0.5, 0.5);
        samples.extend(vec![0.0; 8000]);
        let frames = MetricExtractor::default().frames(&buffer(samples));

        let last = frames.last().unwrap();
        assert!(!last.active);
        assert!(last.pitch.is_none());
        assert!(last.formants.is_none());
        assert!(last.centroid_hz.is_none());
        assert_eq!(last.level_db, spectral::SILENCE_DB);
    }

    // ==========================================================================
    // EXTRACTION
    // ==========================================================================

    #[test]
    fn test_steady_tone_scores() {
        let set = MetricExtractor::default()
            .extract(&buffer(tone(220.0, 1.0, 0.5)))
            .unwrap();

        assert_eq!(set.confidence, Confidence::Normal);
        // Resonance depends on the envelope showing two peaks
        assert!(set.scores.defined_count() >= 4);

        let stability = set.scores.stability.unwrap();
        assert!(stability > 90.0, "stability {}", stability);
        assert!(set.scores.clarity.unwrap() > 50.0);
        assert!(set.scores.power.unwrap() > 85.0, "power {:?}", set.scores.power);

        let f0 = set.details.mean_f0_hz.unwrap();
        assert!((f0 - 220.0).abs() < 2.0, "f0 {}", f0);
        assert_eq!(set.details.silence_ratio, 0.0);

        for (_, value) in set.scores.iter() {
            let Some(v) = value else { continue };
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn test_pitch_wobble_lowers_stability() {
        let extractor = MetricExtractor::default();
        let steady = extractor.extract(&buffer(tone(220.0, 1.0, 0.5))).unwrap();
        let wobbly = extractor
            .extract(&buffer(warble(200.0, 240.0, 0.05, 1.0)))
            .unwrap();

        let s = steady.scores.stability.unwrap();
        let w = wobbly.scores.stability.unwrap();
        assert!(w < s - 20.0, "steady {} vs wobbly {}", s, w);
    }

    #[test]
    fn test_higher_tone_is_brighter() {
        let extractor = MetricExtractor::default();
        let low = extractor.extract(&buffer(tone(110.0, 1.0, 0.5))).unwrap();
        let high = extractor.extract(&buffer(tone(440.0, 1.0, 0.5))).unwrap();

        assert!(
            high.scores.brightness.unwrap() > low.scores.brightness.unwrap() + 20.0,
            "110 Hz: {:?}, 440 Hz: {:?}",
            low.scores.brightness,
            high.scores.brightness
        );
    }

    #[test]
    fn test_quieter_is_less_powerful() {
        let extractor = MetricExtractor::default();
        let loud = extractor.extract(&buffer(tone(220.0, 1.0, 0.5))).unwrap();
        let quiet = extractor.extract(&buffer(tone(220.0, 1.0, 0.02))).unwrap();
        assert!(quiet.scores.power.unwrap() < loud.scores.power.unwrap() - 30.0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = MetricExtractor::default();
        let input = buffer(warble(180.0, 200.0, 0.1, 1.5));

        let first = serde_json::to_string(&extractor.extract(&input).unwrap()).unwrap();
        let second = serde_json::to_string(&extractor.extract(&input).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    // ==========================================================================
    // EDGE CASES
    // ==========================================================================

    #[test]
    fn test_shorter_than_one_frame() {
        let set = MetricExtractor::default()
            .extract(&buffer(tone(220.0, 0.01, 0.5)))
            .unwrap();
        assert_eq!(set.scores, Scores::default());
        assert_eq!(set.confidence, Confidence::Low);
        assert_eq!(set.details.frame_count, 0);
    }

    #[test]
    fn test_silence_is_insufficient() {
        let result = MetricExtractor::default().extract(&buffer(vec![0.0; 3 * SR as usize]));
        match result {
            Err(Error::InsufficientAudio {
                voiced_ms,
                required_ms,
            }) => {
                assert_eq!(voiced_ms, 0.0);
                assert_eq!(required_ms, 300.0);
            }
            other => panic!("expected InsufficientAudio, got {:?}", other),
        }
    }

    #[test]
    fn test_noise_is_insufficient() {
        let result = MetricExtractor::default().extract(&buffer(noise(SR as usize, 0.3)));
        assert!(matches!(result, Err(Error::InsufficientAudio { .. })));
    }

    #[test]
    fn test_brief_voice_is_low_confidence() {
        let mut samples = tone(220.0, 0.2, 0.5);
        samples.extend(vec![0.0; 12800]);

        let set = MetricExtractor::default().extract(&buffer(samples)).unwrap();
        assert_eq!(set.confidence, Confidence::Low);
        assert!(set.scores.stability.is_none());
        assert!(set.scores.clarity.is_none());
        assert!(set.scores.resonance.is_none());
        assert!(set.scores.brightness.is_some());
        assert!(set.scores.power.is_some());
        assert!(set.details.voiced_ms < 300.0);
        assert!(set.details.voiced_frames > 0);
    }

    #[test]
    fn test_mostly_silent_is_low_confidence() {
        // 0.5 s of voice in 10 s of silence: enough voice, but 95% silent
        let mut samples = tone(220.0, 0.5, 0.5);
        samples.extend(vec![0.0; 10 * SR as usize]);

        let set = MetricExtractor::default().extract(&buffer(samples)).unwrap();
        assert!(set.scores.stability.is_some());
        assert!(set.details.silence_ratio > MAX_SILENCE_RATIO);
        assert_eq!(set.confidence, Confidence::Low);
    }

    #[test]
    fn test_custom_lpc_order_is_used() {
        let config = AnalysisConfig {
            lpc_order: 4,
            ..AnalysisConfig::default()
        };
        let extractor = MetricExtractor::new(config);
        assert_eq!(extractor.lpc_order(16000), 4);
        assert_eq!(MetricExtractor::default().lpc_order(16000), 18);
    }

    // ==========================================================================
    // RESONANCE WITHOUT FORMANTS
    // ==========================================================================
    //
    // An order-2 LPC model has a single pole pair, so its envelope can show
    // at most one peak. No frame yields an F1/F2 pair and resonance must be
    // undefined rather than a zero that would drag down worst and balance.
    // ==========================================================================

    #[test]
    fn test_no_formant_pair_leaves_resonance_undefined() {
        let config = AnalysisConfig {
            lpc_order: 2,
            ..AnalysisConfig::default()
        };
        let set = MetricExtractor::new(config)
            .extract(&buffer(tone(220.0, 1.0, 0.5)))
            .unwrap();

        assert!(set.scores.resonance.is_none());
        assert!(set.details.mean_f1_hz.is_none());
        assert!(set.scores.stability.is_some());
        assert_eq!(set.confidence, Confidence::Normal);

        let result = crate::compare::compare(&set, &crate::compare::IdealProfile::default());
        assert_ne!(result.worst, Some(Axis::Resonance));
        assert!(result.delta(Axis::Resonance).is_none());
    }
}
