//! Fundamental frequency and harmonicity by normalized autocorrelation
//!
//! For a lag τ the normalized autocorrelation
//!
//! ```text
//!            Σ x[i]·x[i+τ]
//! r(τ) = ─────────────────────────
//!        √(Σ x[i]² · Σ x[i+τ]²)
//! ```
//!
//! is 1.0 when the window repeats exactly every τ samples and near 0 for
//! noise. The lag of the strongest repetition is the pitch period, and the
//! strength of that repetition is how much of the frame is harmonic.

use serde::Serialize;

/// Pitch search settings, in samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchRange {
    pub min_lag: usize,
    pub max_lag: usize,
}

impl PitchRange {
    /// Lag range covering `min_hz..=max_hz` at `sample_rate`
    pub fn from_hz(min_hz: f64, max_hz: f64, sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        let min_lag = ((sr / max_hz).floor() as usize).max(2);
        let max_lag = ((sr / min_hz).ceil() as usize).max(min_lag + 2);
        Self { min_lag, max_lag }
    }

    /// Window length that fits two periods of the lowest pitch
    pub fn window_len(&self, frame_len: usize) -> usize {
        frame_len.max(2 * self.max_lag + 1)
    }
}

/// Pitch of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchEstimate {
    pub f0_hz: f64,
    /// Peak normalized autocorrelation (0..1)
    pub strength: f64,
}

/// Estimate the fundamental of `window`.
///
/// Returns `None` when the autocorrelation has no interior peak in range,
/// which happens for silence, noise and windows too short for the range.
pub fn estimate(window: &[f64], range: PitchRange, sample_rate: u32) -> Option<PitchEstimate> {
    // Lags need enough overlap to be meaningful
    let max_lag = range.max_lag.min(window.len().saturating_sub(1) / 2);
    if max_lag < range.min_lag + 2 {
        return None;
    }

    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let centered: Vec<f64> = window.iter().map(|x| x - mean).collect();

    let r: Vec<f64> = (range.min_lag..=max_lag)
        .map(|lag| normalized_autocorrelation(&centered, lag))
        .collect();

    // Interior local maxima only; range edges are not peaks
    let peaks: Vec<usize> = (1..r.len() - 1)
        .filter(|&i| r[i] > r[i - 1] && r[i] >= r[i + 1] && r[i] > 0.0)
        .collect();

    let best = peaks.iter().map(|&i| r[i]).fold(f64::NEG_INFINITY, f64::max);
    if !best.is_finite() {
        return None;
    }

    // The first peak close to the best avoids octave errors at 2τ, 3τ...
    let chosen = peaks.iter().copied().find(|&i| r[i] >= 0.9 * best)?;
    let lag = range.min_lag as f64 + chosen as f64 + parabolic_offset(r[chosen - 1], r[chosen], r[chosen + 1]);

    Some(PitchEstimate {
        f0_hz: sample_rate as f64 / lag,
        strength: best.clamp(0.0, 1.0),
    })
}

/// Normalized autocorrelation of `x` at `lag`
pub fn normalized_autocorrelation(x: &[f64], lag: usize) -> f64 {
    if lag >= x.len() {
        return 0.0;
    }
    let (head, tail) = (&x[..x.len() - lag], &x[lag..]);

    let mut cross = 0.0;
    let mut e_head = 0.0;
    let mut e_tail = 0.0;
    for (a, b) in head.iter().zip(tail) {
        cross += a * b;
        e_head += a * a;
        e_tail += b * b;
    }

    let denom = (e_head * e_tail).sqrt();
    if denom <= f64::EPSILON {
        0.0
    } else {
        cross / denom
    }
}

/// Sub-sample peak offset from three neighbouring values, in [-0.5, 0.5]
fn parabolic_offset(left: f64, center: f64, right: f64) -> f64 {
    let denom = left - 2.0 * center + right;
    if denom.abs() <= f64::EPSILON {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}

/// Harmonics-to-noise ratio (dB) from a normalized autocorrelation peak
pub fn hnr_db(strength: f64) -> f64 {
    let r = strength.clamp(1e-6, 1.0 - 1e-6);
    10.0 * (r / (1.0 - r)).log10()
}

/// Pitch change between two frames, in semitones
pub fn semitones(from_hz: f64, to_hz: f64) -> f64 {
    12.0 * (to_hz / from_hz).log2()
}
