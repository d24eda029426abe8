//! In-process decoding with symphonia
//!
//! Covers the common containers (WAV, FLAC, MP3, AAC/M4A, Ogg Vorbis, ALAC)
//! without any external binary. The decoded audio is folded to mono,
//! resampled by linear interpolation and written out as the same canonical
//! 16-bit WAV the ffmpeg backend produces, so the loader never needs to know
//! which backend ran.

use super::{Decode, PcmArtifact};
use crate::error::{Error, Result};
use crate::loader::{fold_to_mono, write_pcm16_wav};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDecoder;

impl NativeDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decode for NativeDecoder {
    fn name(&self) -> &str {
        "native"
    }

    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    fn decode(&self, input: &Path, target_rate: u32, scratch: &Path) -> Result<PcmArtifact> {
        let (mono, source_rate) = decode_to_mono(input)?;
        tracing::debug!(
            "Decoded {} samples at {} Hz from {}",
            mono.len(),
            source_rate,
            input.display()
        );

        let resampled = resample_linear(&mono, source_rate, target_rate);
        if resampled.is_empty() {
            return Err(Error::decode_failed("resampling produced no samples"));
        }

        let artifact = PcmArtifact::in_scratch(scratch, target_rate);
        write_pcm16_wav(&artifact.path, &resampled, target_rate)?;
        Ok(artifact)
    }
}

/// Decode a file to mono f32 samples; returns (samples, sample_rate)
fn decode_to_mono(input: &Path) -> Result<(Vec<f32>, u32)> {
    let file = File::open(input)
        .map_err(|e| Error::decode_failed(format!("cannot open {}: {}", input.display(), e)))?;

    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    if len == 0 {
        return Err(Error::decode_failed(format!("{} is empty", input.display())));
    }

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = input.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::decode_failed(format!("unrecognized container: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::decode_failed("no audio track found"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::decode_failed("stream does not declare a sample rate"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::decode_failed(format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(Error::decode_failed(format!("failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Corrupt packets are skipped, like ffmpeg does
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(Error::decode_failed(format!("decoder error: {}", e))),
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count();
        let needed = decoded.capacity() as u64;

        let buf = match sample_buf.as_mut() {
            Some(buf) if buf.capacity() >= needed as usize * channel_count => buf,
            _ => sample_buf.insert(SampleBuffer::new(needed, spec)),
        };
        buf.copy_interleaved_ref(decoded);
        samples.extend(fold_to_mono(buf.samples(), channel_count));
    }

    if samples.is_empty() {
        return Err(Error::decode_failed("stream decoded to zero samples"));
    }

    Ok((samples, sample_rate))
}

/// Linear interpolation resampler for a whole mono buffer
pub fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if input.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }
    if from_rate == to_rate {
        return input.to_vec();
    }

    // Input frames per output frame
    let step = from_rate as f64 / to_rate as f64;
    let output_len = ((input.len() as f64) / step).floor().max(1.0) as usize;
    let last = input.len() - 1;

    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            let a = input[idx];
            let b = input[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}
