//! Report generation for batch analysis
//!
//! - **JSON**: full reports, machine-readable
//! - **CSV**: one row per file, spreadsheet-friendly
//!
//! # Usage
//!
//! ```ignore
//! use voicescope::report;
//!
//! // Automatically picks format based on extension
//! report::generate("session.json", &outcomes)?;  // JSON
//! report::generate("session.csv", &outcomes)?;   // CSV
//! ```

pub mod csv;
pub mod json;

use crate::error::{Error, Result};
use crate::pipeline::AnalysisReport;
use serde::Serialize;
use std::path::Path;

/// Why a file could not be analyzed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Stable error identifier (see `Error::kind`)
    pub kind: String,
    pub message: String,
}

/// Result of analyzing one file in a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

impl FileOutcome {
    pub fn new<P: AsRef<Path>>(path: P, result: Result<AnalysisReport>) -> Self {
        let path = path.as_ref().display().to_string();
        match result {
            Ok(report) => Self {
                path,
                report: Some(report),
                error: None,
            },
            Err(e) => Self {
                path,
                report: None,
                error: Some(Failure {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                }),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.report.is_some()
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        match &self.report {
            Some(r) => r.file_name.clone(),
            None => Path::new(&self.path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.clone()),
        }
    }
}

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, outcomes: &[FileOutcome]) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "json" => json::write(&mut std::fs::File::create(path)?, outcomes),
        "csv" | "" => csv::write(&mut std::fs::File::create(path)?, outcomes),
        other => Err(Error::config(format!(
            "unsupported report format .{} (use .json or .csv)",
            other
        ))),
    }
}

/// Summary statistics for a batch of outcomes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub analyzed: usize,
    pub low_confidence: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };

        for outcome in outcomes {
            match &outcome.report {
                Some(report) => {
                    summary.analyzed += 1;
                    if report.metrics.is_low_confidence() {
                        summary.low_confidence += 1;
                    }
                }
                None => summary.failed += 1,
            }
        }

        summary
    }
}
