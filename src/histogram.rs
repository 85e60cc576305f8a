//! Histogram bins and running statistics
//!
//! The analysis library keeps one histogram per [`HistType`] while sampling
//! lines through the variable box. This module holds the bin layout that the
//! client pushes into the library, the accumulator used by the in-process mock
//! library, and [`HistogramStats`], the snapshot the client reads back.
//!
//! # Bin Layout
//!
//! A layout is a sorted list of upper bounds plus the width of the first bin.
//! Internally the edges are `[ub[0] - first_width, ub[0], .., ub[n-1], +inf]`,
//! so bin `b` counts points in `[edge[b], edge[b+1])`, points below the first
//! edge are "below range" and points at or above the last bound are "above
//! range".
//!
//! # Statistics
//!
//! Mean and variance are accumulated with Welford's algorithm; the squared
//! sum uses Kahan compensation.

use crate::error::{Result, WorkshopError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which quantity a histogram collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistType {
    Shape,
    Slope,
    FunctionValue,
    LineLength,
}

impl HistType {
    pub const ALL: [HistType; 4] = [
        HistType::Shape,
        HistType::Slope,
        HistType::FunctionValue,
        HistType::LineLength,
    ];

    pub fn code(&self) -> u8 {
        match self {
            HistType::Shape => b's',
            HistType::Slope => b'd',
            HistType::FunctionValue => b'f',
            HistType::LineLength => b'l',
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| i32::from(t.code()) == code)
            .ok_or(WorkshopError::UnexpectedCode {
                what: "histogram type",
                code,
            })
    }

    /// Bin layout the library starts with
    pub fn default_bins(&self) -> BinLayout {
        match self {
            HistType::Shape | HistType::FunctionValue => BinLayout {
                first_width: 900.0,
                upper_bounds: vec![
                    -100.0, -10.0, -1.0, -0.1, -0.0001, 0.0001, 0.1, 1.0, 10.0, 100.0, 1000.0,
                ],
            },
            HistType::Slope | HistType::LineLength => BinLayout {
                first_width: 5.0,
                upper_bounds: vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 750.0, 1000.0],
            },
        }
    }
}

impl fmt::Display for HistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistType::Shape => write!(f, "Shape"),
            HistType::Slope => write!(f, "Slope"),
            HistType::FunctionValue => write!(f, "Function value"),
            HistType::LineLength => write!(f, "Line length"),
        }
    }
}

/// User-configurable bin layout for one histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinLayout {
    /// Width of the lowest bin, measured down from the smallest upper bound
    pub first_width: f64,
    /// Upper bound of each bin
    pub upper_bounds: Vec<f64>,
}

impl BinLayout {
    /// Check that the layout can be handed to the library
    pub fn validate(&self) -> Result<()> {
        if self.upper_bounds.is_empty() {
            return Err(WorkshopError::Validation(
                "A histogram needs at least one bin".to_string(),
            ));
        }
        if !(self.first_width.is_finite() && self.first_width > 0.0) {
            return Err(WorkshopError::Validation(
                "The first bin width must be a positive number".to_string(),
            ));
        }
        if self.upper_bounds.iter().any(|b| !b.is_finite()) {
            return Err(WorkshopError::Validation(
                "Bin upper bounds must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bounds in ascending order
    pub fn sorted_bounds(&self) -> Vec<f64> {
        let mut bounds = self.upper_bounds.clone();
        bounds.sort_by(f64::total_cmp);
        bounds
    }

    pub fn num_bins(&self) -> usize {
        self.upper_bounds.len()
    }
}

/// Snapshot of one histogram as read back from the library
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramStats {
    pub bins: Vec<u64>,
    pub below_range: u64,
    pub above_range: u64,
    pub data_points: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub population_variance: f64,
    pub minimum: f64,
    pub maximum: f64,
}

impl HistogramStats {
    pub fn outside_range(&self) -> u64 {
        self.below_range + self.above_range
    }
}

/// Running histogram with Welford statistics
#[derive(Debug, Clone)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<u64>,
    points: u64,
    mean: f64,
    sq: f64,
    sq_comp: f64,
    min: f64,
    max: f64,
}

impl Histogram {
    pub fn new(layout: &BinLayout) -> Self {
        let mut hist = Self {
            edges: Vec::new(),
            counts: Vec::new(),
            points: 0,
            mean: 0.0,
            sq: 0.0,
            sq_comp: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        hist.set_bins(layout);
        hist
    }

    /// Replace the bin layout; clears everything accumulated so far
    pub fn set_bins(&mut self, layout: &BinLayout) {
        let bounds = layout.sorted_bounds();
        self.edges.clear();
        if let Some(first) = bounds.first() {
            self.edges.push(first - layout.first_width);
        }
        self.edges.extend_from_slice(&bounds);
        self.edges.push(f64::INFINITY);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.counts = vec![0; self.edges.len()];
        self.points = 0;
        self.mean = 0.0;
        self.sq = 0.0;
        self.sq_comp = 0.0;
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
    }

    pub fn accumulate(&mut self, point: f64) {
        // index of the first edge strictly greater than the point
        let slot = self.edges.partition_point(|edge| *edge <= point);
        let last = self.counts.len().saturating_sub(1);
        if let Some(count) = self.counts.get_mut(slot.min(last)) {
            *count += 1;
        }
        self.points += 1;

        let new_mean = self.mean + (point - self.mean) / self.points as f64;
        let comp_add = (point - self.mean) * (point - new_mean) - self.sq_comp;
        let new_sq = self.sq + comp_add;
        self.sq_comp = (new_sq - self.sq) - comp_add;
        self.sq = new_sq;
        self.mean = new_mean;

        self.max = self.max.max(point);
        self.min = self.min.min(point);
    }

    pub fn num_bins(&self) -> usize {
        self.edges.len().saturating_sub(2)
    }

    /// Count in bin `bin`, `None` when out of range
    pub fn bin(&self, bin: usize) -> Option<u64> {
        if bin < self.num_bins() {
            self.counts.get(bin + 1).copied()
        } else {
            None
        }
    }

    pub fn below_range(&self) -> u64 {
        self.counts.first().copied().unwrap_or(0)
    }

    pub fn above_range(&self) -> u64 {
        self.counts.last().copied().unwrap_or(0)
    }

    pub fn data_points(&self) -> u64 {
        self.points
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; NaN before any point is seen
    pub fn variance(&self) -> f64 {
        if self.points > 0 {
            self.sq / (self.points as f64 - 1.0)
        } else {
            f64::NAN
        }
    }

    pub fn population_variance(&self) -> f64 {
        if self.points > 0 {
            self.sq / self.points as f64
        } else {
            f64::NAN
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn minimum(&self) -> f64 {
        self.min
    }

    pub fn maximum(&self) -> f64 {
        self.max
    }

    pub fn stats(&self) -> HistogramStats {
        HistogramStats {
            bins: (0..self.num_bins()).filter_map(|b| self.bin(b)).collect(),
            below_range: self.below_range(),
            above_range: self.above_range(),
            data_points: self.data_points(),
            mean: self.mean(),
            std_dev: self.std_dev(),
            variance: self.variance(),
            population_variance: self.population_variance(),
            minimum: self.minimum(),
            maximum: self.maximum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout(first_width: f64, bounds: &[f64]) -> BinLayout {
        BinLayout {
            first_width,
            upper_bounds: bounds.to_vec(),
        }
    }

    #[test]
    fn test_bin_assignment() {
        let mut hist = Histogram::new(&layout(5.0, &[10.0, 5.0, 20.0]));
        assert_eq!(hist.num_bins(), 3);

        hist.accumulate(-1.0); // below 0
        hist.accumulate(0.0); // [0, 5)
        hist.accumulate(4.9);
        hist.accumulate(5.0); // [5, 10)
        hist.accumulate(19.0); // [10, 20)
        hist.accumulate(20.0); // above
        hist.accumulate(f64::INFINITY);

        assert_eq!(hist.below_range(), 1);
        assert_eq!(hist.bin(0), Some(2));
        assert_eq!(hist.bin(1), Some(1));
        assert_eq!(hist.bin(2), Some(1));
        assert_eq!(hist.bin(3), None);
        assert_eq!(hist.above_range(), 2);
        assert_eq!(hist.data_points(), 7);
    }

    #[test]
    fn test_empty_statistics() {
        let hist = Histogram::new(&HistType::Slope.default_bins());
        assert_eq!(hist.data_points(), 0);
        assert!(hist.variance().is_nan());
        assert!(hist.population_variance().is_nan());
        assert_eq!(hist.minimum(), f64::INFINITY);
        assert_eq!(hist.maximum(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_mean_and_variance() {
        let mut hist = Histogram::new(&HistType::Shape.default_bins());
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            hist.accumulate(v);
        }
        assert!((hist.mean() - 5.0).abs() < 1e-12);
        assert!((hist.population_variance() - 4.0).abs() < 1e-12);
        assert!((hist.variance() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(hist.minimum(), 2.0);
        assert_eq!(hist.maximum(), 9.0);
    }

    #[test]
    fn test_set_bins_resets() {
        let mut hist = Histogram::new(&HistType::LineLength.default_bins());
        hist.accumulate(3.0);
        hist.set_bins(&layout(1.0, &[1.0, 2.0]));
        assert_eq!(hist.data_points(), 0);
        assert_eq!(hist.num_bins(), 2);
    }

    #[test]
    fn test_default_layouts() {
        let shape = HistType::Shape.default_bins();
        assert_eq!(shape.num_bins(), 11);
        assert_eq!(shape.first_width, 900.0);
        let slope = HistType::Slope.default_bins();
        assert_eq!(slope.num_bins(), 9);
        assert!(slope.validate().is_ok());
    }

    #[test]
    fn test_layout_validation() {
        assert!(layout(1.0, &[]).validate().is_err());
        assert!(layout(0.0, &[1.0]).validate().is_err());
        assert!(layout(1.0, &[f64::NAN]).validate().is_err());
    }

    #[test]
    fn test_hist_type_codes() {
        for t in HistType::ALL {
            assert_eq!(HistType::from_code(t.code() as i32).unwrap(), t);
        }
        assert!(HistType::from_code('x' as i32).is_err());
    }

    proptest! {
        #[test]
        fn prop_every_point_is_counted(points in prop::collection::vec(-2000.0f64..2000.0, 0..200)) {
            let mut hist = Histogram::new(&HistType::Shape.default_bins());
            for p in &points {
                hist.accumulate(*p);
            }
            let stats = hist.stats();
            let binned: u64 = stats.bins.iter().sum();
            prop_assert_eq!(binned + stats.outside_range(), points.len() as u64);
        }
    }
}
