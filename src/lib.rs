//! Voicescope - Score voice recordings
//!
//! Voicescope turns an uploaded recording (any audio or common video
//! container) into five 0-100 scores describing the voice in it, then
//! compares those scores against an ideal profile.
//!
//! # Pipeline
//!
//! 1. **Format probing**: the file name's extension is only a hint. Unknown
//!    extensions are logged, never rejected; the decoder is the authority.
//!
//! 2. **Decoding**: an external `ffmpeg` (with a hard timeout) or the native
//!    symphonia backend produces a mono 16-bit WAV at 16 kHz inside a
//!    per-request scratch directory.
//!
//! 3. **Metric extraction**: 25 ms frames every 10 ms. Pitch, harmonicity,
//!    formants, spectral centroid and level are measured per frame and
//!    aggregated into the scores.
//!
//! 4. **Comparison**: per-axis deltas to the ideal, strongest and weakest
//!    axis, and a balance score.
//!
//! # Quick Start
//!
//! ```no_run
//! use voicescope::{Analyzer, Axis, Config};
//!
//! let analyzer = Analyzer::new(Config::default())?;
//! let report = analyzer.analyze_file("take-3.m4a")?;
//!
//! for axis in Axis::ALL {
//!     println!("{:<10} {:?}", axis, report.metrics.score(axis));
//! }
//! println!("Balance: {:?}", report.comparison.balance);
//! for line in &report.insights {
//!     println!("- {}", line);
//! }
//! # Ok::<(), voicescope::Error>(())
//! ```
//!
//! # Scores
//!
//! | Axis | Measures | Undefined when |
//! |------|----------|----------------|
//! | stability | frame-to-frame pitch steadiness | no voiced audio |
//! | clarity | harmonics-to-noise ratio | no voiced audio |
//! | resonance | F1/F2 energy balance | no formant pair found |
//! | brightness | spectral centroid | no active audio |
//! | power | level and level steadiness | no active audio |
//!
//! # Modules
//!
//! - [`formats`]: advertised extensions and temp-file naming
//! - [`decoder`]: ffmpeg and native decoding backends
//! - [`loader`]: reading the canonical WAV into an [`AudioBuffer`]
//! - [`analyzer`]: frame-level DSP and score aggregation
//! - [`compare`]: comparison with the ideal profile
//! - [`pipeline`]: request-scoped orchestration
//! - [`report`]: batch output formatters (JSON, CSV)
//! - [`serve`]: HTTP API

pub mod analyzer;
pub mod compare;
pub mod config;
pub mod decoder;
pub mod error;
pub mod formats;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod serve;

pub use analyzer::{Axis, Confidence, MetricExtractor, MetricSet, Scores};
pub use compare::{compare, ComparisonResult, IdealProfile};
pub use config::{Config, DecoderBackend};
pub use decoder::Decode;
pub use error::{Error, Result};
pub use loader::AudioBuffer;
pub use pipeline::{AnalysisReport, Analyzer};
