//! JSON report

use super::{FileOutcome, Summary};
use crate::error::{Error, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    tool: &'static str,
    version: &'static str,
    summary: Summary,
    files: &'a [FileOutcome],
}

pub fn write<W: Write>(writer: &mut W, outcomes: &[FileOutcome]) -> Result<()> {
    let report = JsonReport {
        generated: chrono::Local::now().to_rfc3339(),
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        summary: Summary::from_outcomes(outcomes),
        files: outcomes,
    };

    serde_json::to_writer_pretty(&mut *writer, &report)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    writeln!(writer)?;
    Ok(())
}
