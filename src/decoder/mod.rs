//! Decoding arbitrary uploads into the canonical PCM artifact
//!
//! Every backend turns "some audio or video file" into the same thing: a
//! mono, 16-bit PCM WAV at the target sample rate, written inside a scratch
//! directory owned by the caller.
//!
//! ```text
//! Backend  | How                               | Availability
//! ---------|-----------------------------------|------------------------------
//! ffmpeg   | external subprocess               | binary must resolve
//! native   | symphonia + linear resampler      | always (fewer containers)
//! auto     | ffmpeg, else native               | always
//! ```
//!
//! The backend is chosen once, by [`select`], and the rest of the pipeline
//! only ever talks to a `dyn Decode`.

pub mod ffmpeg;
pub mod locate;
pub mod native;

pub use ffmpeg::FfmpegDecoder;
pub use locate::BinaryLocator;
pub use native::NativeDecoder;

use crate::config::{DecoderBackend, DecoderConfig};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// File name of the artifact inside the scratch directory
pub const ARTIFACT_NAME: &str = "converted.wav";

/// The canonical mono PCM WAV produced by a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmArtifact {
    pub path: PathBuf,
    pub sample_rate: u32,
}

impl PcmArtifact {
    pub fn in_scratch(scratch: &Path, sample_rate: u32) -> Self {
        Self {
            path: scratch.join(ARTIFACT_NAME),
            sample_rate,
        }
    }
}

/// A decoding capability
pub trait Decode: Send + Sync {
    /// Short backend name for logs and reports
    fn name(&self) -> &str;

    /// Verify the backend can run. Must not touch the filesystem beyond lookups.
    fn check_available(&self) -> Result<()>;

    /// Decode `input` into `scratch`, resampled to `target_rate`
    fn decode(&self, input: &Path, target_rate: u32, scratch: &Path) -> Result<PcmArtifact>;
}

/// Pick the decoder for a configuration
pub fn select(config: &DecoderConfig) -> Box<dyn Decode> {
    match config.backend {
        DecoderBackend::Ffmpeg => Box::new(FfmpegDecoder::from_config(config)),
        DecoderBackend::Native => Box::new(NativeDecoder::new()),
        DecoderBackend::Auto => {
            let ffmpeg = FfmpegDecoder::from_config(config);
            match ffmpeg.check_available() {
                Ok(()) => Box::new(ffmpeg),
                Err(e) => {
                    tracing::info!("{}; falling back to native decoding", e);
                    Box::new(NativeDecoder::new())
                }
            }
        }
    }
}
