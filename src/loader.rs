//! Waveform loading
//!
//! Reads the canonical PCM artifact written by a decoder into an
//! [`AudioBuffer`]: mono `f32` samples in roughly [-1, 1] plus the sample
//! rate. Multi-channel data is folded to mono by averaging, in case a
//! decoder ever hands back more than one channel.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::Serialize;
use std::path::Path;

/// Normalized mono waveform
///
/// Immutable once built: one per request, dropped when the request is done.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    source_channels: u16,
}

/// Buffer metadata handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BufferInfo {
    pub sample_rate: u32,
    pub sample_count: usize,
    pub duration_secs: f64,
    pub source_channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, source_channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::unsupported("sample rate must be positive"));
        }
        if samples.is_empty() {
            return Err(Error::EmptyAudio);
        }
        Ok(Self {
            samples,
            sample_rate,
            source_channels: source_channels.max(1),
        })
    }

    /// Build from interleaved samples, averaging channels to mono
    pub fn from_interleaved(interleaved: &[f32], channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(Error::unsupported("channel count must be positive"));
        }
        Self::new(fold_to_mono(interleaved, channels as usize), sample_rate, channels)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channels present before folding to mono
    pub fn source_channels(&self) -> u16 {
        self.source_channels
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn info(&self) -> BufferInfo {
        BufferInfo {
            sample_rate: self.sample_rate,
            sample_count: self.samples.len(),
            duration_secs: self.duration_secs(),
            source_channels: self.source_channels,
        }
    }
}

/// Average interleaved channels into one
pub fn fold_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}

/// Load a WAV artifact into a mono buffer
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let reader = WavReader::open(path)
        .map_err(|e| Error::unsupported(format!("cannot parse {}: {}", path.display(), e)))?;

    let spec = reader.spec();
    tracing::debug!(
        "Loading {}: {} Hz, {} channel(s), {} bits {:?}",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved = read_samples(reader, spec)?;
    if interleaved.is_empty() {
        return Err(Error::EmptyAudio);
    }

    AudioBuffer::from_interleaved(&interleaved, spec.channels, spec.sample_rate)
}

fn read_samples<R: std::io::Read>(mut reader: WavReader<R>, spec: WavSpec) -> Result<Vec<f32>> {
    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>(),
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|sample| sample as f32 * scale))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
        (format, bits) => {
            return Err(Error::unsupported(format!(
                "{} bit {:?} samples",
                bits, format
            )))
        }
    };

    samples.map_err(|e| Error::unsupported(format!("failed to read samples: {}", e)))
}

/// Write mono samples as a 16-bit PCM WAV (the canonical artifact format)
pub fn write_pcm16_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| Error::decode_failed(format!("cannot create artifact: {}", e)))?;

    for &s in samples {
        let value = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer
            .write_sample(value)
            .map_err(|e| Error::decode_failed(format!("cannot write artifact: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Error::decode_failed(format!("cannot finalize artifact: {}", e)))
}
