//! Comparison against the ideal profile
//!
//! ```text
//! delta(axis)  = measured - ideal          (negative = shortfall)
//! best / worst = highest / lowest measured (ties -> first in canonical order)
//! balance      = clamp(100 - 2 * stddev(measured), 0, 100)
//! ```
//!
//! Undefined axes are carried through as `None` and skipped by best, worst
//! and balance. Pure and deterministic; no I/O.

use crate::analyzer::{round2, Axis, MetricSet};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Reference values the measured scores are compared against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdealProfile {
    pub stability: f64,
    pub clarity: f64,
    pub resonance: f64,
    pub brightness: f64,
    pub power: f64,
}

impl Default for IdealProfile {
    fn default() -> Self {
        Self {
            stability: 85.0,
            clarity: 80.0,
            resonance: 75.0,
            brightness: 60.0,
            power: 80.0,
        }
    }
}

impl IdealProfile {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Stability => self.stability,
            Axis::Clarity => self.clarity,
            Axis::Resonance => self.resonance,
            Axis::Brightness => self.brightness,
            Axis::Power => self.power,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for axis in Axis::ALL {
            let value = self.get(axis);
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::config(format!(
                    "ideal.{} must be within 0-100, got {}",
                    axis, value
                )));
            }
        }
        Ok(())
    }
}

/// One axis of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDelta {
    pub axis: Axis,
    pub measured: Option<f64>,
    pub ideal: f64,
    /// `measured - ideal`; `None` when the axis is undefined
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// One entry per axis, canonical order
    pub deltas: Vec<AxisDelta>,
    pub best: Option<Axis>,
    pub worst: Option<Axis>,
    pub balance: Option<f64>,
}

impl ComparisonResult {
    pub fn delta(&self, axis: Axis) -> Option<f64> {
        self.deltas
            .iter()
            .find(|d| d.axis == axis)
            .and_then(|d| d.delta)
    }

    /// Short human-readable observations
    pub fn insights(&self) -> Vec<String> {
        let mut lines = Vec::new();

        let measured = |axis: Axis| {
            self.deltas
                .iter()
                .find(|d| d.axis == axis)
                .and_then(|d| d.measured)
                .unwrap_or(0.0)
        };

        if let Some(best) = self.best {
            lines.push(format!("Strongest area: {} ({:.1})", best, measured(best)));
        }
        if let (Some(worst), Some(best)) = (self.worst, self.best) {
            if worst != best {
                lines.push(format!("Weakest area: {} ({:.1})", worst, measured(worst)));
            }
        }

        // Largest shortfall, first axis on ties
        let shortfall = self
            .deltas
            .iter()
            .filter_map(|d| d.delta.filter(|&v| v < 0.0).map(|v| (d.axis, v)))
            .fold(None, |acc: Option<(Axis, f64)>, (axis, v)| match acc {
                Some((_, worst)) if worst <= v => acc,
                _ => Some((axis, v)),
            });

        match shortfall {
            Some((axis, v)) => lines.push(format!(
                "Largest gap to ideal: {} is {:.1} points below target",
                axis, -v
            )),
            None if self.best.is_some() => {
                lines.push("Every measured area meets or exceeds the ideal profile".to_string())
            }
            None => {}
        }

        if let Some(balance) = self.balance {
            let shape = if balance >= 80.0 {
                "well balanced"
            } else if balance >= 50.0 {
                "moderately balanced"
            } else {
                "uneven"
            };
            lines.push(format!("Overall profile is {} ({:.1})", shape, balance));
        }

        let undefined: Vec<&str> = self
            .deltas
            .iter()
            .filter(|d| d.measured.is_none())
            .map(|d| d.axis.name())
            .collect();
        if !undefined.is_empty() {
            lines.push(format!("Not enough voiced audio to rate: {}", undefined.join(", ")));
        }

        lines
    }
}

/// Compare measured scores with the ideal profile
pub fn compare(metrics: &MetricSet, ideal: &IdealProfile) -> ComparisonResult {
    let deltas: Vec<AxisDelta> = Axis::ALL
        .iter()
        .map(|&axis| {
            let measured = metrics.score(axis);
            let target = ideal.get(axis);
            AxisDelta {
                axis,
                measured,
                ideal: target,
                delta: measured.map(|m| m - target),
            }
        })
        .collect();

    let defined: Vec<(Axis, f64)> = deltas
        .iter()
        .filter_map(|d| d.measured.map(|m| (d.axis, m)))
        .collect();

    // Strict comparisons keep the first axis on ties
    let mut best: Option<(Axis, f64)> = None;
    let mut worst: Option<(Axis, f64)> = None;
    for &(axis, value) in &defined {
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((axis, value));
        }
        if worst.map_or(true, |(_, w)| value < w) {
            worst = Some((axis, value));
        }
    }

    let balance = if defined.is_empty() {
        None
    } else {
        let n = defined.len() as f64;
        let mean = defined.iter().map(|(_, v)| v).sum::<f64>() / n;
        let variance = defined.iter().map(|(_, v)| (v - mean).powi(2)).sum::<f64>() / n;
        Some(round2((100.0 - 2.0 * variance.sqrt()).clamp(0.0, 100.0)))
    };

    ComparisonResult {
        deltas,
        best: best.map(|(axis, _)| axis),
        worst: worst.map(|(axis, _)| axis),
        balance,
    }
}
