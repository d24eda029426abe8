//! Spectral and level measurements on single analysis frames
//!
//! Uses FFT (Fast Fourier Transform) to find where a frame's energy sits in
//! frequency, plus the small level helpers every other measurement leans on.
//!
//! # Brightness
//!
//! The spectral centroid is the magnitude-weighted mean frequency of a frame.
//! Dark, muffled voices keep their energy near the fundamental; bright,
//! forward voices push it up into the upper harmonics:
//!
//! ```text
//! Centroid   | Perceived as             | Brightness score
//! -----------|--------------------------|-----------------
//! 80 Hz      | boomy, no presence       | 0
//! 250 Hz     | dark / covered           | ~29
//! 600 Hz     | warm                     | ~52
//! 1500 Hz    | clear, forward           | ~75
//! 4000 Hz    | bright, edgy             | 100
//! ```
//!
//! The score uses a log-frequency scale because pitch and timbre are
//! perceived logarithmically: doubling the centroid always adds the same
//! amount (~17.7 points).

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Centroid mapped to a brightness score of 0
pub const CENTROID_FLOOR_HZ: f64 = 80.0;
/// Centroid mapped to a brightness score of 100
pub const CENTROID_CEIL_HZ: f64 = 4000.0;

/// Level reported for digital silence (dBFS)
pub const SILENCE_DB: f64 = -96.0;

/// Hanning window function
pub fn hanning_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos())
        })
        .collect()
}

/// Hamming window function (used ahead of LPC)
pub fn hamming_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos())
        .collect()
}

/// Convert linear magnitude to dB
pub fn to_db(value: f64) -> f64 {
    if value <= 0.0 {
        SILENCE_DB
    } else {
        (20.0 * value.log10()).max(SILENCE_DB)
    }
}

/// Calculate RMS of a slice
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| x * x).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Map a spectral centroid onto the 0-100 brightness scale
pub fn brightness_score(centroid_hz: f64) -> f64 {
    if centroid_hz <= 0.0 {
        return 0.0;
    }
    let score = 100.0 * (centroid_hz / CENTROID_FLOOR_HZ).ln()
        / (CENTROID_CEIL_HZ / CENTROID_FLOOR_HZ).ln();
    score.clamp(0.0, 100.0)
}

/// Spectral centroid of fixed-length frames
///
/// The FFT plan and window are built once and reused for every frame of a
/// buffer; frames are zero-padded up to the next power of two.
pub struct CentroidAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    fft_size: usize,
}

impl CentroidAnalyzer {
    pub fn new(frame_len: usize) -> Self {
        let fft_size = frame_len.max(2).next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            window: hanning_window(frame_len),
            fft_size,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Magnitude-weighted mean frequency over bins 1..N/2.
    /// `None` when the frame carries no energy above DC.
    pub fn centroid(&self, frame: &[f64], sample_rate: u32) -> Option<f64> {
        let mut buffer: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); self.fft_size];
        for (slot, (&s, &w)) in buffer.iter_mut().zip(frame.iter().zip(self.window.iter())) {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut buffer);

        let bin_hz = sample_rate as f64 / self.fft_size as f64;
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (bin, c) in buffer.iter().enumerate().take(self.fft_size / 2).skip(1) {
            let mag = c.norm();
            weighted += bin as f64 * bin_hz * mag;
            total += mag;
        }

        if total <= f64::EPSILON {
            None
        } else {
            Some(weighted / total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: u32, len: usize, amp: f64) -> Vec<f64> {
        (0..len)
            .map(|i| amp * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    // ==========================================================================
    // EDUCATIONAL BACKGROUND: Frames, Windows and the FFT
    // ==========================================================================
    //
    // Voice changes constantly, so every measurement here is taken on short
    // frames (25 ms by default) where the signal is roughly stationary.
    //
    // KEY CONCEPTS:
    //
    // 1. FREQUENCY RESOLUTION
    //    A 25 ms frame at 16 kHz is 400 samples, padded to a 512-point FFT.
    //    Each bin then spans 16000 / 512 = 31.25 Hz.
    //
    // 2. WINDOWING
    //    Cutting a frame out of a longer signal creates artificial edges.
    //    A taper (Hann for the FFT, Hamming for LPC) fades the edges out so
    //    the edges do not smear energy across the whole spectrum.
    //
    // 3. DECIBELS (dB)
    //    Levels are reported in dBFS: 0 dB is a full-scale signal, -6 dB is
    //    half amplitude, and digital silence is floored at -96 dB.
    // ==========================================================================

    // ==========================================================================
    // WINDOW TESTS
    // ==========================================================================
    //
    // Hann:    w(n) = 0.5 * (1 - cos(2πn/(N-1)))     edges at 0
    // Hamming: w(n) = 0.54 - 0.46 * cos(2πn/(N-1))   edges at 0.08
    // ==========================================================================

    #[test]
    fn test_hanning_window_edges() {
        let window = hanning_window(100);
        assert!(window[0] < 0.001, "Window should start near zero, got {}", window[0]);
        assert!(window[99] < 0.001, "Window should end near zero, got {}", window[99]);
    }

    #[test]
    fn test_hanning_window_center() {
        let window = hanning_window(101);
        assert!((window[50] - 1.0).abs() < 0.001, "center = {}", window[50]);
    }

    #[test]
    fn test_hanning_window_symmetry() {
        let window = hanning_window(100);
        for i in 0..50 {
            assert!(
                (window[i] - window[99 - i]).abs() < 0.001,
                "Window should be symmetric at index {}",
                i
            );
        }
    }

    #[test]
    fn test_hamming_window_edges_do_not_reach_zero() {
        let window = hamming_window(400);
        assert!((window[0] - 0.08).abs() < 1e-9);
        assert!((window[399] - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_window_sizes() {
        assert!(hanning_window(0).is_empty());
        assert_eq!(hanning_window(1), vec![1.0]);
        assert_eq!(hamming_window(1), vec![1.0]);
    }

    // ==========================================================================
    // DECIBEL CONVERSION TESTS
    // ==========================================================================
    //
    //   1.0 → 0 dB (full scale)
    //   0.5 → -6 dB (half amplitude)
    //   0.1 → -20 dB
    //   0.0 → -∞ dB (we floor at -96 dB)
    // ==========================================================================

    #[test]
    fn test_to_db_unity() {
        assert!((to_db(1.0) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_to_db_half() {
        let db = to_db(0.5);
        assert!((db - (-6.02)).abs() < 0.1, "0.5 amplitude should be ~-6dB, got {}", db);
    }

    #[test]
    fn test_to_db_floor() {
        assert_eq!(to_db(0.0), SILENCE_DB);
        assert_eq!(to_db(-1.0), SILENCE_DB);
        assert_eq!(to_db(1e-9), SILENCE_DB);
    }

    // ==========================================================================
    // RMS TESTS
    // ==========================================================================
    //
    // RMS = sqrt(mean(samples²)). A sine of peak A has RMS = A / √2, so a
    // half-scale sine sits at about -9 dBFS.
    // ==========================================================================

    #[test]
    fn test_rms_constant() {
        assert!((rms(&[0.5, 0.5, 0.5, 0.5]) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_rms_empty() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_sine() {
        let s = sine(440.0, 16000, 16000, 0.5);
        assert!((rms(&s) - 0.5 / 2f64.sqrt()).abs() < 1e-3);
        assert!((to_db(rms(&s)) - (-9.03)).abs() < 0.05);
    }

    // ==========================================================================
    // SPECTRAL CENTROID TESTS
    // ==========================================================================
    //
    // For a pure tone the centroid sits on the tone itself; anything else
    // pulls it toward where the extra energy lives.
    // ==========================================================================

    #[test]
    fn test_fft_size_is_next_power_of_two() {
        assert_eq!(CentroidAnalyzer::new(400).fft_size(), 512);
        assert_eq!(CentroidAnalyzer::new(512).fft_size(), 512);
        assert_eq!(CentroidAnalyzer::new(882).fft_size(), 1024);
    }

    #[test]
    fn test_centroid_of_pure_tone() {
        let analyzer = CentroidAnalyzer::new(400);
        let frame = sine(1000.0, 16000, 400, 0.5);
        let c = analyzer.centroid(&frame, 16000).unwrap();
        assert!((c - 1000.0).abs() < 60.0, "centroid = {}", c);
    }

    #[test]
    fn test_centroid_orders_tones() {
        let analyzer = CentroidAnalyzer::new(400);
        let low = analyzer.centroid(&sine(110.0, 16000, 400, 0.5), 16000).unwrap();
        let high = analyzer.centroid(&sine(440.0, 16000, 400, 0.5), 16000).unwrap();
        assert!(high > 3.0 * low, "low = {}, high = {}", low, high);
    }

    #[test]
    fn test_centroid_moves_up_with_harmonics() {
        let analyzer = CentroidAnalyzer::new(400);
        let fundamental = sine(200.0, 16000, 400, 0.5);
        let rich: Vec<f64> = fundamental
            .iter()
            .zip(sine(2000.0, 16000, 400, 0.3))
            .map(|(a, b)| a + b)
            .collect();

        let plain = analyzer.centroid(&fundamental, 16000).unwrap();
        let bright = analyzer.centroid(&rich, 16000).unwrap();
        assert!(bright > plain + 300.0, "plain = {}, bright = {}", plain, bright);
    }

    #[test]
    fn test_centroid_of_silence_is_none() {
        let analyzer = CentroidAnalyzer::new(400);
        assert!(analyzer.centroid(&vec![0.0; 400], 16000).is_none());
    }

    #[test]
    fn test_brightness_scale_anchors() {
        assert_eq!(brightness_score(CENTROID_FLOOR_HZ), 0.0);
        assert!((brightness_score(CENTROID_CEIL_HZ) - 100.0).abs() < 1e-9);
        assert_eq!(brightness_score(20.0), 0.0);
        assert_eq!(brightness_score(12000.0), 100.0);
        assert_eq!(brightness_score(0.0), 0.0);
    }

    #[test]
    fn test_brightness_octave_step() {
        // Every doubling adds 100 * ln 2 / ln 50 points
        let step = brightness_score(640.0) - brightness_score(320.0);
        assert!((step - 17.72).abs() < 0.01, "step = {}", step);
    }
}
