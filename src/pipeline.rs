//! Request-scoped analysis pipeline
//!
//! ```text
//! bytes ─► scratch dir ─► decoder ─► converted.wav ─► AudioBuffer ─► MetricSet ─► ComparisonResult
//!          (TempDir)       (dyn Decode)               (loader)       (analyzer)    (compare)
//! ```
//!
//! Each call owns its own scratch directory, removed when the call returns on
//! every path. The [`Analyzer`] itself is immutable and `Send + Sync`, so one
//! instance can serve many concurrent requests.

use crate::analyzer::{MetricExtractor, MetricSet};
use crate::compare::{compare, ComparisonResult, IdealProfile};
use crate::config::Config;
use crate::decoder::{self, Decode};
use crate::error::{Error, Result};
use crate::formats;
use crate::loader::{load_wav, AudioBuffer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;

/// Decoder name reported for buffers that skipped decoding
const PCM_SOURCE: &str = "pcm";

/// Everything the presentation layer needs for one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub file_name: String,
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub source_channels: u16,
    /// Backend that produced the PCM ("ffmpeg", "native", "pcm")
    pub decoder: String,
    pub metrics: MetricSet,
    pub comparison: ComparisonResult,
    pub insights: Vec<String>,
    pub processing_ms: u64,
}

pub struct Analyzer {
    config: Config,
    decoder: Box<dyn Decode>,
    extractor: MetricExtractor,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("decoder", &self.decoder.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Analyzer {
    /// Validate the configuration and pick the decoder it asks for
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let decoder = decoder::select(&config.decoder);
        let extractor = MetricExtractor::new(config.analysis.clone());
        tracing::debug!("Analyzer ready with {} decoder", decoder.name());
        Ok(Self {
            config,
            decoder,
            extractor,
        })
    }

    /// Replace the decoder (custom backends, tests)
    pub fn with_decoder(mut self, decoder: Box<dyn Decode>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ideal(&self) -> &IdealProfile {
        &self.config.ideal
    }

    pub fn decoder(&self) -> &dyn Decode {
        self.decoder.as_ref()
    }

    /// Analyze raw uploaded bytes. `file_name` is only a format hint.
    pub fn analyze_bytes(&self, bytes: &[u8], file_name: &str) -> Result<AnalysisReport> {
        let start = Instant::now();

        // Before any file is written
        self.decoder.check_available()?;

        if bytes.is_empty() {
            return Err(Error::decode_failed("input is empty"));
        }
        formats::check_advertised(file_name);

        let scratch = self.scratch_dir()?;
        let input = scratch
            .path()
            .join(format!("input{}", formats::temp_suffix(file_name)));
        std::fs::write(&input, bytes)?;

        let artifact = self.decoder.decode(
            &input,
            self.config.decoder.target_sample_rate,
            scratch.path(),
        )?;
        let buffer = load_wav(&artifact.path)?;
        tracing::debug!(
            "{}: {} samples at {} Hz via {}",
            file_name,
            buffer.len(),
            buffer.sample_rate(),
            self.decoder.name()
        );

        self.build_report(file_name, self.decoder.name(), &buffer, start)
    }

    /// Analyze a file on disk
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisReport> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.decoder.check_available()?;
        let bytes = std::fs::read(path)?;
        self.analyze_bytes(&bytes, &file_name)
    }

    /// Analyze PCM that is already in memory (no decoding, no scratch files)
    pub fn analyze_buffer(&self, buffer: &AudioBuffer) -> Result<AnalysisReport> {
        self.build_report(PCM_SOURCE, PCM_SOURCE, buffer, Instant::now())
    }

    /// Metrics only, without comparison
    pub fn extract(&self, buffer: &AudioBuffer) -> Result<MetricSet> {
        self.extractor.extract(buffer)
    }

    fn build_report(
        &self,
        file_name: &str,
        decoder: &str,
        buffer: &AudioBuffer,
        start: Instant,
    ) -> Result<AnalysisReport> {
        let metrics = self.extractor.extract(buffer)?;
        let comparison = compare(&metrics, &self.config.ideal);
        let insights = comparison.insights();
        let processing_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Analyzed {} ({:.1}s) in {}ms: best={:?} worst={:?} balance={:?} confidence={}",
            file_name,
            buffer.duration_secs(),
            processing_ms,
            comparison.best,
            comparison.worst,
            comparison.balance,
            metrics.confidence
        );

        Ok(AnalysisReport {
            file_name: file_name.to_string(),
            sample_rate: buffer.sample_rate(),
            duration_secs: buffer.duration_secs(),
            source_channels: buffer.source_channels(),
            decoder: decoder.to_string(),
            metrics,
            comparison,
            insights,
            processing_ms,
        })
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("voicescope-");
        let dir = match &self.config.decoder.scratch_dir {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}
