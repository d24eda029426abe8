//! Error types for the analysis pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The decoder executable could not be found in any search location.
    #[error("{decoder} was not found (searched: {}). Install it (macOS: `brew install ffmpeg`) or add it to PATH.", format_searched(.searched))]
    DecoderNotFound {
        decoder: String,
        searched: Vec<PathBuf>,
    },

    /// The decoder ran but did not produce a usable artifact.
    #[error("Decoding failed: {diagnostics}")]
    DecodeFailed { diagnostics: String },

    /// The decoder exceeded its time budget and was killed.
    #[error("Decoder timed out after {secs}s")]
    DecodeTimeout { secs: u64 },

    #[error("Decoded audio contains no samples")]
    EmptyAudio,

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Not enough voiced audio to compute the metrics.
    #[error("Insufficient voiced audio: {voiced_ms:.0}ms voiced, {required_ms:.0}ms required")]
    InsufficientAudio { voiced_ms: f64, required_ms: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn decode_failed<S: Into<String>>(diagnostics: S) -> Self {
        Self::DecodeFailed {
            diagnostics: diagnostics.into(),
        }
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Stable identifier for reports and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DecoderNotFound { .. } => "decoder_not_found",
            Error::DecodeFailed { .. } => "decode_failed",
            Error::DecodeTimeout { .. } => "decode_timeout",
            Error::EmptyAudio => "empty_audio",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::InsufficientAudio { .. } => "insufficient_audio",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }

    /// True when the problem lies with the submitted audio rather than the host
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::DecodeFailed { .. }
                | Error::EmptyAudio
                | Error::UnsupportedFormat(_)
                | Error::InsufficientAudio { .. }
        )
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return "nothing".to_string();
    }
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
