//! ffmpeg subprocess backend
//!
//! Runs
//!
//! ```text
//! ffmpeg -hide_banner -loglevel error -y -i <input> -vn -ac 1 -ar <rate> \
//!        -acodec pcm_s16le -f wav <scratch>/converted.wav
//! ```
//!
//! with a hard time limit. stdout/stderr are drained on helper threads so a
//! chatty decoder can never block on a full pipe while we poll for exit.

use super::{BinaryLocator, Decode, PcmArtifact};
use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often the child is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Longest stderr excerpt carried in a `DecodeFailed`
const MAX_DIAGNOSTIC_CHARS: usize = 500;

#[derive(Debug)]
pub struct FfmpegDecoder {
    locator: BinaryLocator,
    timeout: Duration,
}

/// Captured result of a finished subprocess
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl FfmpegDecoder {
    pub fn new(locator: BinaryLocator, timeout: Duration) -> Self {
        Self { locator, timeout }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(
            BinaryLocator::from_config(config),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn locator(&self) -> &BinaryLocator {
        &self.locator
    }

    fn build_command(binary: &Path, input: &Path, output: &Path, target_rate: u32) -> Command {
        let mut command = Command::new(binary);
        command
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg(target_rate.to_string())
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-f")
            .arg("wav")
            .arg(output);
        command
    }
}

impl Decode for FfmpegDecoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn check_available(&self) -> Result<()> {
        self.locator.resolve().map(|_| ())
    }

    fn decode(&self, input: &Path, target_rate: u32, scratch: &Path) -> Result<PcmArtifact> {
        let binary = self.locator.resolve()?;
        let artifact = PcmArtifact::in_scratch(scratch, target_rate);

        tracing::debug!(
            "Running {} on {} -> {} at {} Hz",
            binary.display(),
            input.display(),
            artifact.path.display(),
            target_rate
        );

        let command = Self::build_command(&binary, input, &artifact.path, target_rate);
        let output = run_with_timeout(command, self.timeout)?;

        if !output.status.success() {
            return Err(Error::decode_failed(format!(
                "{} exited with {}: {}",
                self.locator.program(),
                output.status,
                excerpt(&output.stderr)
            )));
        }

        let produced = std::fs::metadata(&artifact.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(Error::decode_failed(format!(
                "{} produced no output: {}",
                self.locator.program(),
                excerpt(&output.stderr)
            )));
        }

        Ok(artifact)
    }
}

/// Run a command, killing it once `timeout` elapses
pub fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<CommandOutput> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|e| Error::decode_failed(format!("failed to start decoder: {}", e)))?;

    let stdout_thread = child.stdout.take().map(drain);
    let stderr_thread = child.stderr.take().map(drain);

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                abandon(&mut child, stdout_thread, stderr_thread);
                return Err(Error::Io(e));
            }
        }

        if start.elapsed() > timeout {
            abandon(&mut child, stdout_thread, stderr_thread);
            tracing::warn!("Decoder killed after {:?}", timeout);
            return Err(Error::DecodeTimeout {
                secs: timeout.as_secs().max(1),
            });
        }

        thread::sleep(POLL_INTERVAL);
    };

    Ok(CommandOutput {
        status,
        stdout: join(stdout_thread),
        stderr: join(stderr_thread),
    })
}

/// Kill and reap the child, then collect the drain threads
fn abandon(
    child: &mut Child,
    stdout_thread: Option<thread::JoinHandle<Vec<u8>>>,
    stderr_thread: Option<thread::JoinHandle<Vec<u8>>>,
) {
    let _ = child.kill();
    let _ = child.wait();
    join(stdout_thread);
    join(stderr_thread);
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "(no diagnostics)".to_string();
    }
    trimmed.chars().take(MAX_DIAGNOSTIC_CHARS).collect()
}
