//! Configuration management
//!
//! All tunables live in one [`Config`] value that is loaded once and then
//! passed (immutably) into the pipeline. The on-disk format is TOML; every
//! field has a default so a partial file is valid.

use crate::compare::IdealProfile;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which decoding implementation the pipeline uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderBackend {
    /// External ffmpeg subprocess; a missing binary is a hard error
    #[default]
    Ffmpeg,
    /// In-process symphonia decoding
    Native,
    /// ffmpeg when it resolves, otherwise native
    Auto,
}

/// Decoder/resampler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub backend: DecoderBackend,

    /// Executable name looked up in PATH and the well-known directories
    pub binary: String,

    /// Absolute path tried before any search
    pub override_path: Option<PathBuf>,

    /// Extra directories probed after the well-known ones
    pub search_dirs: Vec<PathBuf>,

    /// Command printing a package-manager prefix (e.g. `brew --prefix`)
    pub prefix_command: Vec<String>,

    /// Hard limit for one decoder invocation (seconds)
    pub timeout_secs: u64,

    /// Sample rate of the canonical PCM artifact (Hz)
    pub target_sample_rate: u32,

    /// Root for per-request scratch directories (system temp dir when unset)
    pub scratch_dir: Option<PathBuf>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            backend: DecoderBackend::default(),
            binary: "ffmpeg".to_string(),
            override_path: None,
            search_dirs: Vec::new(),
            prefix_command: vec!["brew".to_string(), "--prefix".to_string()],
            timeout_secs: 60,
            target_sample_rate: 16000,
            scratch_dir: None,
        }
    }
}

/// Metric extractor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analysis window length (ms)
    pub frame_ms: f64,
    /// Analysis stride (ms)
    pub hop_ms: f64,
    /// Minimum frame RMS level (dBFS) for a frame to count as active
    pub silence_threshold_db: f64,
    /// Voiced audio required for pitch-based metrics (ms)
    pub min_voiced_ms: f64,
    pub min_pitch_hz: f64,
    pub max_pitch_hz: f64,
    /// Peak normalized autocorrelation needed to call a frame voiced
    pub voicing_threshold: f64,
    /// LPC order for formant estimation; 0 picks `2 + sample_rate / 1000`
    pub lpc_order: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_ms: 25.0,
            hop_ms: 10.0,
            silence_threshold_db: -45.0,
            min_voiced_ms: 300.0,
            min_pitch_hz: 75.0,
            max_pitch_hz: 800.0,
            voicing_threshold: 0.45,
            lpc_order: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.frame_ms > 0.0) {
            return Err(Error::config("analysis.frame_ms must be positive"));
        }
        if !(self.hop_ms > 0.0) || self.hop_ms > self.frame_ms {
            return Err(Error::config(
                "analysis.hop_ms must be positive and no larger than frame_ms",
            ));
        }
        if !(self.min_pitch_hz > 0.0) || self.min_pitch_hz >= self.max_pitch_hz {
            return Err(Error::config(
                "analysis.min_pitch_hz must be positive and below max_pitch_hz",
            ));
        }
        if !(self.voicing_threshold > 0.0 && self.voicing_threshold < 1.0) {
            return Err(Error::config("analysis.voicing_threshold must be in (0, 1)"));
        }
        if self.min_voiced_ms < 0.0 {
            return Err(Error::config("analysis.min_voiced_ms must not be negative"));
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decoder: DecoderConfig,
    pub analysis: AnalysisConfig,
    pub ideal: IdealProfile,
}

impl Config {
    /// Load from an explicit path, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                return Err(Error::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.decoder.target_sample_rate == 0 {
            return Err(Error::config("decoder.target_sample_rate must be positive"));
        }
        if self.decoder.timeout_secs == 0 {
            return Err(Error::config("decoder.timeout_secs must be positive"));
        }
        if self.decoder.binary.trim().is_empty() {
            return Err(Error::config("decoder.binary must not be empty"));
        }
        self.analysis.validate()?;
        self.ideal.validate()
    }

    /// `<config_dir>/voicescope/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voicescope").join("config.toml"))
    }
}
