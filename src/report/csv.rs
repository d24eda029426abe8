//! CSV report: one row per file

use super::FileOutcome;
use crate::analyzer::Axis;
use crate::error::Result;
use std::io::Write;

const HEADER: &str = "file,status,stability,clarity,resonance,brightness,power,balance,best,worst,confidence,duration_secs,decoder,error";

pub fn write<W: Write>(writer: &mut W, outcomes: &[FileOutcome]) -> Result<()> {
    writeln!(writer, "{}", HEADER)?;

    for outcome in outcomes {
        let mut fields: Vec<String> = vec![escape(&outcome.path)];

        match (&outcome.report, &outcome.error) {
            (Some(report), _) => {
                fields.push("ok".to_string());
                for axis in Axis::ALL {
                    fields.push(number(report.metrics.score(axis)));
                }
                fields.push(number(report.comparison.balance));
                fields.push(axis_name(report.comparison.best));
                fields.push(axis_name(report.comparison.worst));
                fields.push(report.metrics.confidence.to_string());
                fields.push(format!("{:.2}", report.duration_secs));
                fields.push(escape(&report.decoder));
                fields.push(String::new());
            }
            (None, error) => {
                fields.push(
                    error
                        .as_ref()
                        .map(|e| e.kind.clone())
                        .unwrap_or_else(|| "error".to_string()),
                );
                // Scores, balance, best, worst, confidence, duration, decoder
                fields.extend(std::iter::repeat(String::new()).take(Axis::ALL.len() + 6));
                fields.push(escape(
                    error.as_ref().map(|e| e.message.as_str()).unwrap_or(""),
                ));
            }
        }

        writeln!(writer, "{}", fields.join(","))?;
    }

    Ok(())
}

fn number(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn axis_name(axis: Option<Axis>) -> String {
    axis.map(|a| a.name().to_string()).unwrap_or_default()
}

/// Quote a field when it contains a delimiter, quote or newline
fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
