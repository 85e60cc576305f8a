//! Handle traits for the analysis library
//!
//! The analysis library exposes two kinds of opaque handles: a problem handle
//! with the static definition of an instance, and an analysis handle holding
//! sampling results and temporary bounds for one problem. These traits are the
//! only way the rest of the crate talks to the library, so the in-process mock
//! and the native binding are interchangeable.
//!
//! Every call returns [`Result`]. Results that the library may not have
//! computed yet come back as [`Outcome`], never as an error.

use crate::config::AnalysisSettings;
use crate::error::Result;
use crate::histogram::{BinLayout, HistType, HistogramStats};
use crate::types::{
    Bounds, ConstraintType, EmpiricalShape, FunctionKind, FunctionShape, ObjectiveType,
    OptimumEffect, Outcome, Presence, RegionEffect, VariableType,
};
use std::path::PathBuf;

/// Static definition of a loaded problem instance
///
/// Implementations must be `Send + Sync`: a problem is shared read-only by
/// every view and by background tasks.
#[cfg_attr(test, mockall::automock)]
pub trait ProblemBackend: Send + Sync {
    /// Instance name, empty when the reader did not supply one
    fn instance_name(&self) -> Result<String>;

    fn variable_count(&self) -> Result<usize>;
    fn variable_name(&self, variable: usize) -> Result<String>;
    fn variable_type(&self, variable: usize) -> Result<VariableType>;
    fn variable_bounds(&self, variable: usize) -> Result<Bounds>;

    /// Constraints and objectives that reference a variable
    fn variable_presence(&self, variable: usize) -> Result<Presence>;

    fn constraint_count(&self) -> Result<usize>;
    fn constraint_name(&self, constraint: usize) -> Result<String>;
    fn constraint_type(&self, constraint: usize) -> Result<ConstraintType>;
    fn constraint_bounds(&self, constraint: usize) -> Result<Bounds>;
    fn constraint_variables(&self, constraint: usize) -> Result<Vec<usize>>;

    fn objective_count(&self) -> Result<usize>;
    fn objective_name(&self, objective: usize) -> Result<String>;
    fn objective_type(&self, objective: usize) -> Result<ObjectiveType>;
    fn objective_variables(&self, objective: usize) -> Result<Vec<usize>>;

    /// Algebraic shape of a constraint or objective
    fn function_shape(&self, kind: FunctionKind, index: usize) -> Result<FunctionShape>;

    /// Create a fresh analysis handle for this problem
    fn create_analysis(&self) -> Result<Box<dyn AnalysisBackend>>;
}

/// Sampling results and tunables for one problem
///
/// Only `Send` is required: the handle lives behind a mutex in
/// [`AnalysisState`](crate::state::AnalysisState).
#[cfg_attr(test, mockall::automock)]
pub trait AnalysisBackend: Send {
    /// Sample lines through the variable box for one function
    ///
    /// With `extra_histograms` the four extra histograms are reset and then
    /// filled from this function's sample points.
    fn sample(&mut self, kind: FunctionKind, index: usize, extra_histograms: bool) -> Result<()>;

    /// Temporary bounds of a variable
    fn bounds(&self, variable: usize) -> Result<Bounds>;
    fn set_bounds(&mut self, variable: usize, bounds: Bounds) -> Result<()>;

    /// Restore every temporary bound to the variable's original bounds
    fn reset_bounds(&mut self) -> Result<()>;

    fn settings(&self) -> Result<AnalysisSettings>;
    fn apply_settings(&mut self, settings: &AnalysisSettings) -> Result<()>;

    fn empirical_shape(&self, kind: FunctionKind, index: usize) -> Result<Outcome<EmpiricalShape>>;
    fn region_effect(&self, constraint: usize) -> Result<Outcome<RegionEffect>>;
    fn optimum_effect(&self, objective: usize) -> Result<Outcome<OptimumEffect>>;

    /// Lower and upper bound effectiveness of a constraint
    fn effectiveness(&self, constraint: usize) -> Result<Outcome<(f64, f64)>>;

    /// Best objective value found
    fn extremum(&self, objective: usize) -> Result<Outcome<f64>>;

    /// Point where the best objective value was found, one entry per variable
    fn extremum_point(&self, objective: usize) -> Result<Outcome<Vec<f64>>>;

    fn histogram(&self, hist: HistType) -> Result<HistogramStats>;
    fn set_histogram_bins(&mut self, hist: HistType, layout: &BinLayout) -> Result<()>;
}

/// Opens problem instances from files
pub trait ProblemLoader: Send + Sync {
    /// Load one instance; several files may make up a single instance
    fn open(&self, files: &[PathBuf]) -> Result<Box<dyn ProblemBackend>>;
}
