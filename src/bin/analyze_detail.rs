//! Per-frame dump for investigating a single recording's scores
//!
//! Decodes each file with the configured backend, then prints every frame's
//! level, voicing, pitch, centroid and formants followed by the aggregate
//! metrics.

use anyhow::Context;
use std::env;
use voicescope::analyzer::FrameStats;
use voicescope::decoder;
use voicescope::loader::load_wav;
use voicescope::{Config, MetricExtractor};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: analyze_detail <file1> [file2]");
        std::process::exit(1);
    }

    let config = Config::load(None)?;
    let decoder = decoder::select(&config.decoder);
    decoder.check_available()?;
    let extractor = MetricExtractor::new(config.analysis.clone());

    for path in &args[1..] {
        println!("\n{}", "=".repeat(72));
        println!("FILE: {}", path);
        println!("{}", "=".repeat(72));

        let scratch = tempfile::Builder::new().prefix("voicescope-").tempdir()?;
        let artifact = decoder
            .decode(
                std::path::Path::new(path),
                config.decoder.target_sample_rate,
                scratch.path(),
            )
            .with_context(|| format!("decoding {}", path))?;
        let buffer = load_wav(&artifact.path)?;

        println!(
            "{} samples @ {} Hz ({:.2}s), decoder: {}",
            buffer.len(),
            buffer.sample_rate(),
            buffer.duration_secs(),
            decoder.name()
        );
        println!(
            "\n{:>6} {:>8} {:>8} {:>3} {:>8} {:>6} {:>8} {:>8} {:>8}",
            "frame", "time", "level", "v", "f0", "r", "centroid", "F1", "F2"
        );

        for frame in extractor.frames(&buffer) {
            print_frame(&frame);
        }

        match extractor.extract(&buffer) {
            Ok(metrics) => {
                println!("\nMETRICS");
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            }
            Err(e) => println!("\nNo metrics: {}", e),
        }
    }

    Ok(())
}

fn print_frame(frame: &FrameStats) {
    let opt = |v: Option<f64>| v.map(|x| format!("{:.1}", x)).unwrap_or_else(|| "-".into());

    println!(
        "{:>6} {:>8.3} {:>8.1} {:>3} {:>8} {:>6} {:>8} {:>8} {:>8}",
        frame.index,
        frame.start_secs,
        frame.level_db,
        if frame.voiced { "*" } else if frame.active { "." } else { " " },
        opt(frame.pitch.as_ref().map(|p| p.f0_hz)),
        frame
            .pitch
            .as_ref()
            .map(|p| format!("{:.2}", p.strength))
            .unwrap_or_else(|| "-".into()),
        opt(frame.centroid_hz),
        opt(frame.formants.as_ref().map(|f| f.f1_hz)),
        opt(frame.formants.as_ref().map(|f| f.f2_hz)),
    );
}
