use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use voicescope::report::{FileOutcome, Summary};
use voicescope::{formats, Analyzer, Axis, Config};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "voicescope")]
#[command(author, version, about = "Score voice recordings for stability, clarity, resonance, brightness and power")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: <config dir>/voicescope/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze audio/video files or directories
    Analyze {
        /// Files or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output report file (.csv, .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print full reports as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Number of parallel workers (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Only show summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Serve the JSON analysis API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Request worker threads
        #[arg(short, long, default_value = "4")]
        workers: usize,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;

    match args.command {
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Command::Serve { port, workers } => {
            let analyzer = Analyzer::new(config)?;
            voicescope::serve::start(port, workers, analyzer).context("server error")
        }
        Command::Analyze {
            paths,
            output,
            json,
            jobs,
            quiet,
        } => {
            let analyzer = Analyzer::new(config)?;
            let failed = analyze(&analyzer, &paths, output.as_deref(), json, jobs, quiet)?;
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "voicescope=debug" } else { "voicescope=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directories into the audio files they contain
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && formats::is_supported_path(e.path()))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Returns the number of files that failed
fn analyze(
    analyzer: &Analyzer,
    paths: &[PathBuf],
    output: Option<&Path>,
    json: bool,
    jobs: Option<usize>,
    quiet: bool,
) -> anyhow::Result<usize> {
    if let Some(jobs) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = collect_files(paths);
    if files.is_empty() {
        bail!(
            "No audio files found (supported: {})",
            formats::SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    let show_progress = !quiet && !json && files.len() > 1;
    if !quiet && !json {
        eprintln!("\x1b[1mVoicescope\x1b[0m");
        eprintln!("{}", "─".repeat(78));
        eprintln!("Found {} file(s), decoder: {}\n", files.len(), analyzer.decoder().name());
    }

    let pb = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| {
            let outcome = FileOutcome::new(path, analyzer.analyze_file(path));
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(outcome.file_name());
            }
            outcome
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let summary = Summary::from_outcomes(&outcomes);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        if !quiet {
            print_table(&outcomes);
        }
        print_summary(&summary);
    }

    if let Some(path) = output {
        voicescope::report::generate(path, &outcomes)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        if !quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", path.display());
        }
    }

    Ok(summary.failed)
}

fn print_table(outcomes: &[FileOutcome]) {
    println!(
        "{:<6} {:>6} {:>6} {:>6} {:>6} {:>6}  {:>7}  {:<6}  {}",
        "", "stab", "clar", "reso", "brig", "powr", "balance", "conf", "file"
    );

    for outcome in outcomes {
        match (&outcome.report, &outcome.error) {
            (Some(report), _) => {
                let color = if report.metrics.is_low_confidence() {
                    "\x1b[33m" // Yellow
                } else {
                    "\x1b[32m" // Green
                };
                let scores: Vec<String> = Axis::ALL
                    .iter()
                    .map(|&axis| cell(report.metrics.score(axis)))
                    .collect();
                println!(
                    "{}{:<6}\x1b[0m {}  {:>7}  {:<6}  {}",
                    color,
                    "[ok]",
                    scores.join(" "),
                    cell(report.comparison.balance),
                    report.metrics.confidence,
                    report.file_name
                );
            }
            (None, error) => {
                let message = error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                println!(
                    "\x1b[31m{:<6}\x1b[0m {}  {}",
                    "[fail]",
                    outcome.file_name(),
                    truncate(&message, 70)
                );
            }
        }
    }
}

fn print_summary(summary: &Summary) {
    eprintln!("\n{}", "─".repeat(78));
    eprintln!("\x1b[1mSummary:\x1b[0m");
    eprintln!("  \x1b[32m✓ Analyzed:\x1b[0m       {}", summary.analyzed);
    if summary.low_confidence > 0 {
        eprintln!("  \x1b[33m? Low confidence:\x1b[0m {}", summary.low_confidence);
    }
    if summary.failed > 0 {
        eprintln!("  \x1b[31m✗ Failed:\x1b[0m         {}", summary.failed);
    }
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:>6.1}", v),
        None => format!("{:>6}", "-"),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
