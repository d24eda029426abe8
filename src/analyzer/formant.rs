//! Formant estimation by linear prediction
//!
//! LPC models a frame as the output of an all-pole filter: each sample is
//! predicted from the previous `p` samples. The poles of that filter sit on
//! the vocal tract resonances, so the filter's magnitude response (the
//! "envelope") shows the formants as peaks, without the harmonic ripple a
//! raw FFT would have.
//!
//! ```text
//!  dB │      F1
//!     │     ╱╲        F2
//!     │    ╱  ╲      ╱╲
//!     │   ╱    ╲____╱  ╲___
//!     │__╱                 ╲____
//!     └──────────────────────────── Hz
//!        300  700   1200  2500
//! ```
//!
//! A balanced, resonant voice keeps F1 and F2 at similar strength; a voice
//! that collapses into one resonance shows a large level gap between them.

use super::spectral::hamming_window;
use serde::Serialize;

/// Pre-emphasis coefficient
pub const PRE_EMPHASIS: f64 = 0.97;
/// Points on which the envelope is evaluated
pub const ENVELOPE_POINTS: usize = 512;
/// Upper edge of the envelope search (Hz)
pub const ENVELOPE_MAX_HZ: f64 = 5000.0;
/// Envelope peaks below this are treated as DC / breath, not formants (Hz)
pub const MIN_FORMANT_HZ: f64 = 90.0;
/// Level gap (dB) at which the balance index falls to 1/e
pub const BALANCE_SCALE_DB: f64 = 12.0;

/// First two formants of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormantPair {
    pub f1_hz: f64,
    pub f1_db: f64,
    pub f2_hz: f64,
    pub f2_db: f64,
}

impl FormantPair {
    /// 100 when F1 and F2 are equally strong, falling with the level gap
    pub fn balance_index(&self) -> f64 {
        100.0 * (-(self.f1_db - self.f2_db).abs() / BALANCE_SCALE_DB).exp()
    }
}

/// Envelope peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub hz: f64,
    pub db: f64,
}

/// Default LPC order for a sample rate: two poles per kHz plus two
pub fn default_order(sample_rate: u32) -> usize {
    2 + sample_rate as usize / 1000
}

/// Apply `y[n] = x[n] - a·x[n-1]`
pub fn pre_emphasize(frame: &[f64], coefficient: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(frame.len());
    let mut prev = 0.0;
    for &x in frame {
        out.push(x - coefficient * prev);
        prev = x;
    }
    out
}

/// Autocorrelation R[0..=order]
pub fn autocorrelation(x: &[f64], order: usize) -> Vec<f64> {
    (0..=order)
        .map(|lag| {
            if lag >= x.len() {
                0.0
            } else {
                x.iter().zip(&x[lag..]).map(|(a, b)| a * b).sum()
            }
        })
        .collect()
}

/// Levinson-Durbin recursion.
///
/// Returns predictor coefficients `a[1..=p]` with `x[n] ≈ Σ a[k]·x[n-k]`,
/// or `None` when the autocorrelation is degenerate (silence, or a
/// prediction error that collapses to zero).
pub fn levinson_durbin(r: &[f64]) -> Option<Vec<f64>> {
    let order = r.len().checked_sub(1)?;
    if order == 0 || r[0] <= 0.0 {
        return None;
    }

    let mut a = vec![0.0; order + 1];
    let mut error = r[0];

    for i in 1..=order {
        let mut acc = r[i];
        for j in 1..i {
            acc -= a[j] * r[i - j];
        }
        let k = acc / error;

        let prev = a.clone();
        a[i] = k;
        for j in 1..i {
            a[j] = prev[j] - k * prev[i - j];
        }

        error *= 1.0 - k * k;
        if error <= r[0] * 1e-12 {
            // Perfectly predictable so far; higher orders add nothing
            a.truncate(i + 1);
            break;
        }
    }

    Some(a[1..].to_vec())
}

/// LPC envelope in dB on `points` frequencies spread over `0..=max_hz`
pub fn envelope(coefficients: &[f64], sample_rate: u32, max_hz: f64, points: usize) -> Vec<Peak> {
    let step = if points > 1 { max_hz / (points - 1) as f64 } else { 0.0 };
    (0..points)
        .map(|i| {
            let hz = i as f64 * step;
            let omega = 2.0 * std::f64::consts::PI * hz / sample_rate as f64;

            // A(e^jω) = 1 - Σ a[k]·e^{-jωk}
            let mut re = 1.0;
            let mut im = 0.0;
            for (k, &a) in coefficients.iter().enumerate() {
                let phase = omega * (k + 1) as f64;
                re -= a * phase.cos();
                im += a * phase.sin();
            }
            let magnitude = (re * re + im * im).sqrt().max(1e-12);
            Peak {
                hz,
                db: -20.0 * magnitude.log10(),
            }
        })
        .collect()
}

/// Interior local maxima of an envelope above `min_hz`, in frequency order
pub fn envelope_peaks(envelope: &[Peak], min_hz: f64) -> Vec<Peak> {
    if envelope.len() < 3 {
        return Vec::new();
    }
    envelope
        .windows(3)
        .filter(|w| w[1].db > w[0].db && w[1].db >= w[2].db && w[1].hz > min_hz)
        .map(|w| w[1])
        .collect()
}

/// F1/F2 of a frame, `None` when fewer than two resonances are found
pub fn formants(frame: &[f64], sample_rate: u32, order: usize) -> Option<FormantPair> {
    if frame.len() <= order {
        return None;
    }

    let emphasized = pre_emphasize(frame, PRE_EMPHASIS);
    let windowed: Vec<f64> = emphasized
        .iter()
        .zip(hamming_window(frame.len()))
        .map(|(x, w)| x * w)
        .collect();

    let r = autocorrelation(&windowed, order);
    let coefficients = levinson_durbin(&r)?;

    let max_hz = ENVELOPE_MAX_HZ.min(sample_rate as f64 / 2.0);
    let env = envelope(&coefficients, sample_rate, max_hz, ENVELOPE_POINTS);
    let peaks = envelope_peaks(&env, MIN_FORMANT_HZ);

    match peaks.as_slice() {
        [first, second, ..] => Some(FormantPair {
            f1_hz: first.hz,
            f1_db: first.db,
            f2_hz: second.hz,
            f2_db: second.db,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SR: u32 = 16000;

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / SR as f64).sin())
            .collect()
    }

    // ==========================================================================
    // EDUCATIONAL BACKGROUND: Linear Prediction
    // ==========================================================================
    //
    // If a signal obeys x[n] = 0.9·x[n-1] + noise, its autocorrelation is
    // R[k] = 0.9^k (normalized). Levinson-Durbin recovers the 0.9 from R in
    // O(p²) without inverting a matrix, and higher-order coefficients come
    // out as zero because nothing more is predictable.
    //
    // Pre-emphasis (x[n] - 0.97·x[n-1]) tilts the spectrum up by ~6 dB per
    // octave, undoing the natural roll-off of the glottal source so the
    // upper formants are not drowned out by F1.
    // ==========================================================================

    #[test]
    fn test_default_order() {
        assert_eq!(default_order(16000), 18);
        assert_eq!(default_order(8000), 10);
        assert_eq!(default_order(44100), 46);
    }

    #[test]
    fn test_pre_emphasis() {
        let out = pre_emphasize(&[1.0, 1.0, 1.0], 0.97);
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], 0.03, epsilon = 1e-12);
        assert_relative_eq!(out[2], 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_autocorrelation_lags() {
        let r = autocorrelation(&[1.0, 2.0, 3.0], 3);
        assert_eq!(r, vec![14.0, 8.0, 3.0, 0.0]);
    }

    #[test]
    fn test_levinson_recovers_ar1() {
        let r: Vec<f64> = (0..=4).map(|k| 0.9f64.powi(k)).collect();
        let a = levinson_durbin(&r).unwrap();
        assert_eq!(a.len(), 4);
        assert_relative_eq!(a[0], 0.9, epsilon = 1e-12);
        for &coef in &a[1..] {
            assert!(coef.abs() < 1e-12, "higher order coefficient {}", coef);
        }
    }

    #[test]
    fn test_levinson_rejects_silence() {
        assert!(levinson_durbin(&[0.0, 0.0, 0.0]).is_none());
        assert!(levinson_durbin(&[]).is_none());
    }

    // ==========================================================================
    // ENVELOPE
    // ==========================================================================
    //
    // A second-order predictor fitted to a pure tone puts its pole pair right
    // on the tone, so the envelope peaks there.
    // ==========================================================================

    #[test]
    fn test_envelope_peak_on_tone() {
        let frame: Vec<f64> = sine(1000.0, 400)
            .iter()
            .zip(hamming_window(400))
            .map(|(x, w)| x * w)
            .collect();
        let a = levinson_durbin(&autocorrelation(&frame, 2)).unwrap();
        let env = envelope(&a, SR, 5000.0, 512);
        let peaks = envelope_peaks(&env, MIN_FORMANT_HZ);

        assert_eq!(peaks.len(), 1, "peaks: {:?}", peaks);
        assert!((peaks[0].hz - 1000.0).abs() < 50.0, "peak at {}", peaks[0].hz);
    }

    #[test]
    fn test_flat_predictor_has_flat_envelope() {
        let env = envelope(&[], SR, 5000.0, 64);
        assert_eq!(env.len(), 64);
        assert!(env.iter().all(|p| p.db.abs() < 1e-12));
        assert!(envelope_peaks(&env, 0.0).is_empty());
        assert_relative_eq!(env[63].hz, 5000.0);
    }

    #[test]
    fn test_envelope_peaks_skip_low_frequencies() {
        let env = vec![
            Peak { hz: 0.0, db: 0.0 },
            Peak { hz: 50.0, db: 10.0 },
            Peak { hz: 100.0, db: 0.0 },
            Peak { hz: 150.0, db: 5.0 },
            Peak { hz: 200.0, db: 1.0 },
        ];
        let peaks = envelope_peaks(&env, MIN_FORMANT_HZ);
        assert_eq!(peaks, vec![Peak { hz: 150.0, db: 5.0 }]);
    }

    // ==========================================================================
    // FORMANT BALANCE
    // ==========================================================================

    #[test]
    fn test_balance_index() {
        let pair = |gap: f64| FormantPair {
            f1_hz: 700.0,
            f1_db: 20.0,
            f2_hz: 1200.0,
            f2_db: 20.0 - gap,
        };
        assert_relative_eq!(pair(0.0).balance_index(), 100.0);
        assert_relative_eq!(pair(12.0).balance_index(), 100.0 / std::f64::consts::E, epsilon = 1e-9);
        assert!(pair(-24.0).balance_index() < 14.0);
    }

    #[test]
    fn test_two_resonances_are_found() {
        // Two tones an octave and a half apart: each gets a pole pair
        let frame: Vec<f64> = sine(600.0, 400)
            .iter()
            .zip(sine(1800.0, 400))
            .map(|(a, b)| a + b)
            .collect();
        let pair = formants(&frame, SR, 4).unwrap();
        assert!((pair.f1_hz - 600.0).abs() < 80.0, "F1 = {}", pair.f1_hz);
        assert!((pair.f2_hz - 1800.0).abs() < 80.0, "F2 = {}", pair.f2_hz);
    }

    #[test]
    fn test_silent_frame_has_no_formants() {
        assert!(formants(&vec![0.0; 400], SR, 18).is_none());
    }
}
