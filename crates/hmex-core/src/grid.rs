use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, HmexError};

/// Largest number of points accepted on one axis.
pub const MAX_AXIS_POINTS: usize = 1_000_000;

/// One swept parameter: an inclusive range and the nominal spacing between points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Range endpoints in any order; the axis always runs from the smaller to the larger.
    pub range: [f64; 2],
    /// Nominal spacing between consecutive points.
    pub increment: f64,
}

impl Axis {
    /// Creates an axis description.
    pub fn new(start: f64, end: f64, increment: f64) -> Self {
        Self {
            range: [start, end],
            increment,
        }
    }

    /// Smallest value on the axis.
    pub fn min(&self) -> f64 {
        self.range[0].min(self.range[1])
    }

    /// Largest value on the axis.
    pub fn max(&self) -> f64 {
        self.range[0].max(self.range[1])
    }

    /// Checks that the endpoints are finite and the increment is positive.
    pub fn validate(&self, name: &str) -> Result<(), HmexError> {
        if !self.range.iter().all(|value| value.is_finite()) {
            return Err(HmexError::Config(
                ErrorInfo::new("axis_range", "axis endpoints must be finite")
                    .with_context("axis", name),
            ));
        }
        if !(self.increment.is_finite() && self.increment > 0.0) {
            return Err(HmexError::Config(
                ErrorInfo::new("axis_increment", "axis increment must be positive")
                    .with_context("axis", name)
                    .with_context("increment", self.increment.to_string()),
            ));
        }
        let steps = (self.max() - self.min()) / self.increment;
        if !(steps.is_finite() && steps.round() < MAX_AXIS_POINTS as f64) {
            return Err(HmexError::Config(
                ErrorInfo::new("axis_points", "axis has too many points")
                    .with_context("axis", name)
                    .with_context("limit", MAX_AXIS_POINTS.to_string()),
            ));
        }
        Ok(())
    }

    /// Number of sample points, `round(|max - min| / increment) + 1`.
    pub fn len(&self) -> usize {
        let span = (self.max() - self.min()).abs();
        if span == 0.0 {
            return 1;
        }
        ((span / self.increment).round() as usize).saturating_add(1)
    }

    /// Always false: an axis has at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Evenly spaced points from `min` to `max`.
    ///
    /// Points come from interpolation rather than repeated addition of the
    /// increment, and the final point is `max` itself.
    pub fn points(&self) -> Vec<f64> {
        linspace(self.min(), self.max(), self.len())
    }
}

/// `count` evenly spaced values on `[start, stop]`, endpoints exact.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|idx| start + idx as f64 * step).collect();
            values[count - 1] = stop;
            values
        }
    }
}

/// The two sweep axes plus the settling window used for summary values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    /// Exchange coupling axis (outer loop).
    pub j: Axis,
    /// External field axis (inner loop).
    pub h: Axis,
    /// Number of trailing iterations averaged into a summary value.
    #[serde(default = "default_settling_window")]
    pub settling_window: usize,
}

fn default_settling_window() -> usize {
    20
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            j: Axis::new(-1.0, -2.0, 0.5),
            h: Axis::new(0.0, 6.0, 0.06),
            settling_window: default_settling_window(),
        }
    }
}

impl SweepGrid {
    /// Validates both axes and the settling window.
    pub fn validate(&self) -> Result<(), HmexError> {
        self.j.validate("j")?;
        self.h.validate("h")?;
        if self.settling_window == 0 {
            return Err(HmexError::config(
                "settling_window",
                "settling window must contain at least one iteration",
            ));
        }
        Ok(())
    }

    /// Number of `(J, h)` pairs in the sweep.
    pub fn pair_count(&self) -> usize {
        self.j.len().saturating_mul(self.h.len())
    }
}

/// Renders a parameter value for file names and column labels.
///
/// Integral values keep a trailing `.0` (`-1.0`), everything else uses the
/// shortest decimal that round-trips (`0.06`).
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Arithmetic mean of the last `window` entries, or of the whole slice when shorter.
///
/// An empty slice yields `NaN`.
pub fn settled_mean(values: &[f64], window: usize) -> f64 {
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    if tail.is_empty() {
        return f64::NAN;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}
