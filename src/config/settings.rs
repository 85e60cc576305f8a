//! Analysis tunables pushed into the analysis library
//!
//! These settings control how the library samples lines through the variable
//! box. They are persisted as part of [`AppConfig`](super::AppConfig) and
//! applied to every freshly created analysis handle.
//!
//! # Main Types
//!
//! - [`AnalysisSettings`] - Line sampling and tolerance parameters
//! - [`HistogramBins`] - Bin layout for each of the extra histograms
//!
//! # Tolerances
//!
//! The library distinguishes "equal" from "almost equal", so the equality
//! tolerance must stay strictly below the almost-equal tolerance. Values
//! whose magnitude exceeds `infinity` are treated as unbounded.

use crate::error::{Result, WorkshopError};
use crate::histogram::{BinLayout, HistType};
use serde::{Deserialize, Serialize};

/// Default magnitude treated as infinite
pub const DEFAULT_INFINITY: f64 = 1e20;

/// Line sampling and tolerance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Shortest line that is sampled
    pub line_length_min: f64,

    /// Longest line that is sampled
    pub line_length_max: f64,

    /// Round integer and binary coordinates of sample points
    pub snap_discrete: bool,

    /// Number of line segments drawn per function
    pub line_segments: u32,

    /// Points evaluated strictly inside each line
    pub interior_line_points: u32,

    /// Minimum successful points before a result is reported
    pub min_points_needed: u32,

    /// Fraction of evaluations allowed to fail
    pub eval_error_tolerance: f64,

    /// Magnitude treated as infinite
    pub infinity: f64,

    /// Tolerance for "equal"
    pub equality_tolerance: f64,

    /// Tolerance for "almost equal"
    pub almost_equal_tolerance: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            line_length_min: 1e-20,
            line_length_max: DEFAULT_INFINITY,
            snap_discrete: true,
            line_segments: 10_000,
            interior_line_points: 7,
            min_points_needed: 25,
            eval_error_tolerance: 0.10,
            infinity: DEFAULT_INFINITY,
            equality_tolerance: 0.0001,
            almost_equal_tolerance: 0.1,
        }
    }
}

impl AnalysisSettings {
    /// Check the settings for consistency before they reach the library
    pub fn validate(&self) -> Result<()> {
        if !(self.line_length_min > 0.0) {
            return Err(invalid("Minimum line length must be positive"));
        }
        if self.line_length_min > self.line_length_max {
            return Err(invalid(
                "Minimum line length must not exceed the maximum line length",
            ));
        }
        if self.line_segments == 0 {
            return Err(invalid("At least one line segment is required"));
        }
        if self.min_points_needed == 0 {
            return Err(invalid("At least one data point must be required"));
        }
        if !(0.0..=1.0).contains(&self.eval_error_tolerance) {
            return Err(invalid(
                "Evaluation error tolerance must be between 0 and 1",
            ));
        }
        if !(self.infinity > 0.0) {
            return Err(invalid("Infinity must be positive"));
        }
        if self.line_length_max > self.infinity {
            return Err(invalid("Maximum line length must not exceed infinity"));
        }
        if self.equality_tolerance < 0.0 {
            return Err(invalid("Equality tolerance must not be negative"));
        }
        if self.equality_tolerance >= self.almost_equal_tolerance {
            return Err(invalid(
                "Equality tolerance must be smaller than the almost equal tolerance",
            ));
        }
        Ok(())
    }

    /// Set both line length bounds, swapping them if given reversed
    pub fn set_line_length_bounds(&mut self, a: f64, b: f64) {
        let (min, max) = if a > b { (b, a) } else { (a, b) };
        self.line_length_min = min.max(f64::EPSILON);
        self.line_length_max = max;
    }

    /// Change infinity, pulling the maximum line length down with it
    pub fn set_infinity(&mut self, infinity: f64) {
        if infinity > 0.0 {
            self.infinity = infinity;
            self.line_length_max = self.line_length_max.min(infinity);
        }
    }
}

fn invalid(msg: &str) -> WorkshopError {
    WorkshopError::Validation(msg.to_string())
}

/// Bin layout for each extra histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramBins {
    pub shape: BinLayout,
    pub slope: BinLayout,
    pub function_value: BinLayout,
    pub line_length: BinLayout,
}

impl Default for HistogramBins {
    fn default() -> Self {
        Self {
            shape: HistType::Shape.default_bins(),
            slope: HistType::Slope.default_bins(),
            function_value: HistType::FunctionValue.default_bins(),
            line_length: HistType::LineLength.default_bins(),
        }
    }
}

impl HistogramBins {
    pub fn get(&self, hist: HistType) -> &BinLayout {
        match hist {
            HistType::Shape => &self.shape,
            HistType::Slope => &self.slope,
            HistType::FunctionValue => &self.function_value,
            HistType::LineLength => &self.line_length,
        }
    }

    /// Replace one layout after validating it
    pub fn set(&mut self, hist: HistType, layout: BinLayout) -> Result<()> {
        layout.validate()?;
        let slot = match hist {
            HistType::Shape => &mut self.shape,
            HistType::Slope => &mut self.slope,
            HistType::FunctionValue => &mut self.function_value,
            HistType::LineLength => &mut self.line_length,
        };
        *slot = layout;
        Ok(())
    }

    pub fn reset(&mut self, hist: HistType) {
        // default layouts always validate
        let _ = self.set(hist, hist.default_bins());
    }

    pub fn iter(&self) -> impl Iterator<Item = (HistType, &BinLayout)> {
        HistType::ALL.into_iter().map(move |h| (h, self.get(h)))
    }
}
