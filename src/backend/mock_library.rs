//! Mock Analysis Library for Testing
//!
//! This module provides an in-process stand-in for the native analysis
//! library so the workshop can run without it. Problems are scripted up front
//! with a builder; analysis results stay "not available" until the function
//! has been sampled, after which the scripted outcome is reported.
//!
//! # Features
//!
//! - **Scripted results**: empirical shape, region/optimum effect, effectiveness and extremum per function
//! - **Temporary bounds**: kept per analysis handle and reset from the original bounds
//! - **Extra histograms**: deterministic sample points fed through [`Histogram`]
//! - **Failure injection**: make sampling or result queries fail for chosen functions
//! - **Sample hooks**: run a callback (and optionally sleep) at the start of each sample
//!
//! # Example
//!
//! ```ignore
//! use mprobe_workshop::backend::mock_library::{MockConstraint, MockLibrary, MockProblem};
//!
//! let problem = MockProblem::new("tiny.nl")
//!     .variable("x", VariableType::Real, -1.0, 1.0)
//!     .constraint(MockConstraint::new("c0", ConstraintType::LessOrEqual, FunctionShape::Linear)
//!         .variables(&[0])
//!         .empirical(EmpiricalShape::Linear));
//!
//! let library = MockLibrary::new().with_instance("tiny.nl", problem);
//! let handle = library.open(&["tiny.nl".into()])?;
//! ```
//!
//! # Enabling
//!
//! The mock library is available when the `mock-library` feature is enabled
//! (on by default).

use crate::config::AnalysisSettings;
use crate::error::{Result, WorkshopError};
use crate::histogram::{BinLayout, HistType, Histogram, HistogramStats};
use crate::types::{
    Bounds, ConstraintType, EmpiricalShape, FunctionKind, FunctionShape, ObjectiveType,
    OptimumEffect, Outcome, Presence, RegionEffect, ResultStatus, VariableType,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::library_trait::{AnalysisBackend, ProblemBackend, ProblemLoader};

/// Callback run at the start of every sample call
pub type SampleHook = Arc<dyn Fn(FunctionKind, usize) + Send + Sync>;

/// A scripted decision variable
#[derive(Debug, Clone)]
pub struct MockVariable {
    pub name: String,
    pub variable_type: VariableType,
    pub bounds: Bounds,
}

/// A scripted constraint
#[derive(Debug, Clone)]
pub struct MockConstraint {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub shape: FunctionShape,
    pub bounds: Bounds,
    pub variables: Vec<usize>,
    pub empirical: Outcome<EmpiricalShape>,
    pub region: Outcome<RegionEffect>,
    pub effectiveness: Outcome<(f64, f64)>,
}

impl MockConstraint {
    /// Create a constraint whose results default to "not available"
    pub fn new(name: impl Into<String>, constraint_type: ConstraintType, shape: FunctionShape) -> Self {
        Self {
            name: name.into(),
            constraint_type,
            shape,
            bounds: Bounds::new(f64::NEG_INFINITY, 0.0),
            variables: Vec::new(),
            empirical: Outcome::Status(ResultStatus::NotAvailable),
            region: Outcome::Status(ResultStatus::NotAvailable),
            effectiveness: Outcome::Status(ResultStatus::NotAvailable),
        }
    }

    pub fn bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Bounds::new(lower, upper);
        self
    }

    pub fn variables(mut self, variables: &[usize]) -> Self {
        self.variables = variables.to_vec();
        self
    }

    pub fn empirical(mut self, shape: EmpiricalShape) -> Self {
        self.empirical = Outcome::Computed(shape);
        self
    }

    pub fn empirical_status(mut self, status: ResultStatus) -> Self {
        self.empirical = Outcome::Status(status);
        self
    }

    pub fn region(mut self, effect: RegionEffect) -> Self {
        self.region = Outcome::Computed(effect);
        self
    }

    pub fn effectiveness(mut self, lower: f64, upper: f64) -> Self {
        self.effectiveness = Outcome::Computed((lower, upper));
        self
    }
}

/// A scripted objective
#[derive(Debug, Clone)]
pub struct MockObjective {
    pub name: String,
    pub objective_type: ObjectiveType,
    pub shape: FunctionShape,
    pub variables: Vec<usize>,
    pub empirical: Outcome<EmpiricalShape>,
    pub optimum: Outcome<OptimumEffect>,
    pub extremum: Outcome<f64>,
}

impl MockObjective {
    pub fn new(name: impl Into<String>, objective_type: ObjectiveType, shape: FunctionShape) -> Self {
        Self {
            name: name.into(),
            objective_type,
            shape,
            variables: Vec::new(),
            empirical: Outcome::Status(ResultStatus::NotAvailable),
            optimum: Outcome::Status(ResultStatus::NotAvailable),
            extremum: Outcome::Status(ResultStatus::NotAvailable),
        }
    }

    pub fn variables(mut self, variables: &[usize]) -> Self {
        self.variables = variables.to_vec();
        self
    }

    pub fn empirical(mut self, shape: EmpiricalShape) -> Self {
        self.empirical = Outcome::Computed(shape);
        self
    }

    pub fn optimum(mut self, effect: OptimumEffect) -> Self {
        self.optimum = Outcome::Computed(effect);
        self
    }

    pub fn extremum(mut self, value: f64) -> Self {
        self.extremum = Outcome::Computed(value);
        self
    }
}

/// Which calls an injected failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockFailure {
    /// `sample` fails for this function
    Sampling(FunctionKind, usize),
    /// Every result query about this function fails
    Results(FunctionKind, usize),
    /// Static name queries fail for this function
    Name(FunctionKind, usize),
}

/// A scripted problem instance
#[derive(Clone, Default)]
pub struct MockProblem {
    pub name: String,
    pub variables: Vec<MockVariable>,
    pub constraints: Vec<MockConstraint>,
    pub objectives: Vec<MockObjective>,
    failures: HashSet<MockFailure>,
    sample_hook: Option<SampleHook>,
    sample_delay: Duration,
}

impl fmt::Debug for MockProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProblem")
            .field("name", &self.name)
            .field("variables", &self.variables.len())
            .field("constraints", &self.constraints.len())
            .field("objectives", &self.objectives.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl MockProblem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn variable(mut self, name: impl Into<String>, ty: VariableType, lower: f64, upper: f64) -> Self {
        self.variables.push(MockVariable {
            name: name.into(),
            variable_type: ty,
            bounds: Bounds::new(lower, upper),
        });
        self
    }

    pub fn constraint(mut self, constraint: MockConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn objective(mut self, objective: MockObjective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        self.failures.insert(failure);
        self
    }

    pub fn with_sample_hook(mut self, hook: SampleHook) -> Self {
        self.sample_hook = Some(hook);
        self
    }

    /// Sleep this long inside every sample call
    pub fn with_sample_delay(mut self, delay: Duration) -> Self {
        self.sample_delay = delay;
        self
    }

    /// A small mixed problem used by the binary and the tests
    ///
    /// Four variables, five constraints (two linear, three nonlinear) and two
    /// objectives.
    pub fn sample() -> Self {
        use ConstraintType as C;
        use FunctionShape as S;

        MockProblem::new("sample.nl")
            .variable("x", VariableType::Real, -10.0, 10.0)
            .variable("y", VariableType::Real, 0.0, 5.0)
            .variable("n", VariableType::Integer, 0.0, 20.0)
            .variable("flag", VariableType::Binary, 0.0, 1.0)
            .constraint(
                MockConstraint::new("budget", C::LessOrEqual, S::Linear)
                    .bounds(f64::NEG_INFINITY, 100.0)
                    .variables(&[0, 1, 2])
                    .empirical(EmpiricalShape::Linear)
                    .region(RegionEffect::Convex)
                    .effectiveness(0.0, 0.35),
            )
            .constraint(
                MockConstraint::new("balance", C::Equality, S::Linear)
                    .bounds(3.0, 3.0)
                    .variables(&[0, 3])
                    .empirical(EmpiricalShape::Linear)
                    .region(RegionEffect::Convex)
                    .effectiveness(0.25, 0.25),
            )
            .constraint(
                MockConstraint::new("disc", C::LessOrEqual, S::Nonlinear)
                    .bounds(f64::NEG_INFINITY, 4.0)
                    .variables(&[0, 1])
                    .empirical(EmpiricalShape::Convex)
                    .region(RegionEffect::Convex)
                    .effectiveness(0.0, 0.6),
            )
            .constraint(
                MockConstraint::new("wave", C::Range, S::Nonlinear)
                    .bounds(-1.0, 1.0)
                    .variables(&[0, 2])
                    .empirical(EmpiricalShape::ConvexAndConcave)
                    .region(RegionEffect::Nonconvex)
                    .effectiveness(0.1, 0.2),
            )
            .constraint(
                MockConstraint::new("shell", C::GreaterOrEqual, S::Nonlinear)
                    .bounds(1.0, f64::INFINITY)
                    .variables(&[1, 2, 3])
                    .empirical(EmpiricalShape::AlmostConcave)
                    .region(RegionEffect::AlmostConvex)
                    .effectiveness(0.45, 0.0),
            )
            .objective(
                MockObjective::new("cost", ObjectiveType::Minimize, S::Quadratic)
                    .variables(&[0, 1, 2])
                    .empirical(EmpiricalShape::Convex)
                    .optimum(OptimumEffect::Global)
                    .extremum(-12.5),
            )
            .objective(
                MockObjective::new("profit", ObjectiveType::Maximize, S::Nonlinear)
                    .variables(&[1, 3])
                    .empirical(EmpiricalShape::AlmostConcave)
                    .optimum(OptimumEffect::Local)
                    .extremum(42.0),
            )
    }

    fn fails(&self, failure: MockFailure) -> bool {
        self.failures.contains(&failure)
    }

    fn function_variables(&self, kind: FunctionKind, index: usize) -> Result<&[usize]> {
        match kind {
            FunctionKind::Constraint => Ok(&self.constraint_at(index)?.variables),
            FunctionKind::Objective => Ok(&self.objective_at(index)?.variables),
        }
    }

    fn variable_at(&self, index: usize) -> Result<&MockVariable> {
        self.variables.get(index).ok_or(WorkshopError::IndexOutOfRange {
            kind: "variable",
            index,
            len: self.variables.len(),
        })
    }

    fn constraint_at(&self, index: usize) -> Result<&MockConstraint> {
        self.constraints
            .get(index)
            .ok_or(WorkshopError::IndexOutOfRange {
                kind: "constraint",
                index,
                len: self.constraints.len(),
            })
    }

    fn objective_at(&self, index: usize) -> Result<&MockObjective> {
        self.objectives
            .get(index)
            .ok_or(WorkshopError::IndexOutOfRange {
                kind: "objective",
                index,
                len: self.objectives.len(),
            })
    }
}

/// Loader that serves scripted problems by file path
#[derive(Debug, Clone, Default)]
pub struct MockLibrary {
    instances: HashMap<PathBuf, MockProblem>,
}

impl MockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `problem` when `path` is opened
    pub fn with_instance(mut self, path: impl Into<PathBuf>, problem: MockProblem) -> Self {
        self.instances.insert(path.into(), problem);
        self
    }

    /// Open a scripted problem directly, bypassing the path lookup
    pub fn open_problem(problem: MockProblem) -> Box<dyn ProblemBackend> {
        Box::new(MockProblemHandle {
            problem: Arc::new(problem),
        })
    }
}

impl ProblemLoader for MockLibrary {
    fn open(&self, files: &[PathBuf]) -> Result<Box<dyn ProblemBackend>> {
        let first = files
            .first()
            .ok_or_else(|| WorkshopError::Load("No files given".to_string()))?;

        let problem = self.instances.get(first.as_path()).ok_or_else(|| {
            WorkshopError::Load(format!("No reader can open {}", first.display()))
        })?;

        tracing::debug!("Mock library opened {}", first.display());
        Ok(Self::open_problem(problem.clone()))
    }
}

/// Problem handle backed by a scripted problem
#[derive(Debug, Clone)]
pub struct MockProblemHandle {
    problem: Arc<MockProblem>,
}

impl ProblemBackend for MockProblemHandle {
    fn instance_name(&self) -> Result<String> {
        Ok(self.problem.name.clone())
    }

    fn variable_count(&self) -> Result<usize> {
        Ok(self.problem.variables.len())
    }

    fn variable_name(&self, variable: usize) -> Result<String> {
        Ok(self.problem.variable_at(variable)?.name.clone())
    }

    fn variable_type(&self, variable: usize) -> Result<VariableType> {
        Ok(self.problem.variable_at(variable)?.variable_type)
    }

    fn variable_bounds(&self, variable: usize) -> Result<Bounds> {
        Ok(self.problem.variable_at(variable)?.bounds)
    }

    fn variable_presence(&self, variable: usize) -> Result<Presence> {
        self.problem.variable_at(variable)?;
        let constraints = self
            .problem
            .constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| c.variables.contains(&variable))
            .map(|(i, _)| i)
            .collect();
        let objectives = self
            .problem
            .objectives
            .iter()
            .enumerate()
            .filter(|(_, o)| o.variables.contains(&variable))
            .map(|(i, _)| i)
            .collect();
        Ok(Presence {
            constraints,
            objectives,
        })
    }

    fn constraint_count(&self) -> Result<usize> {
        Ok(self.problem.constraints.len())
    }

    fn constraint_name(&self, constraint: usize) -> Result<String> {
        if self
            .problem
            .fails(MockFailure::Name(FunctionKind::Constraint, constraint))
        {
            return Err(WorkshopError::Library(format!(
                "name lookup failed for constraint {}",
                constraint
            )));
        }
        Ok(self.problem.constraint_at(constraint)?.name.clone())
    }

    fn constraint_type(&self, constraint: usize) -> Result<ConstraintType> {
        Ok(self.problem.constraint_at(constraint)?.constraint_type)
    }

    fn constraint_bounds(&self, constraint: usize) -> Result<Bounds> {
        Ok(self.problem.constraint_at(constraint)?.bounds)
    }

    fn constraint_variables(&self, constraint: usize) -> Result<Vec<usize>> {
        Ok(self.problem.constraint_at(constraint)?.variables.clone())
    }

    fn objective_count(&self) -> Result<usize> {
        Ok(self.problem.objectives.len())
    }

    fn objective_name(&self, objective: usize) -> Result<String> {
        if self
            .problem
            .fails(MockFailure::Name(FunctionKind::Objective, objective))
        {
            return Err(WorkshopError::Library(format!(
                "name lookup failed for objective {}",
                objective
            )));
        }
        Ok(self.problem.objective_at(objective)?.name.clone())
    }

    fn objective_type(&self, objective: usize) -> Result<ObjectiveType> {
        Ok(self.problem.objective_at(objective)?.objective_type)
    }

    fn objective_variables(&self, objective: usize) -> Result<Vec<usize>> {
        Ok(self.problem.objective_at(objective)?.variables.clone())
    }

    fn function_shape(&self, kind: FunctionKind, index: usize) -> Result<FunctionShape> {
        match kind {
            FunctionKind::Constraint => Ok(self.problem.constraint_at(index)?.shape),
            FunctionKind::Objective => Ok(self.problem.objective_at(index)?.shape),
        }
    }

    fn create_analysis(&self) -> Result<Box<dyn AnalysisBackend>> {
        Ok(Box::new(MockAnalysis::new(self.problem.clone())))
    }
}

/// Analysis handle over a scripted problem
pub struct MockAnalysis {
    problem: Arc<MockProblem>,
    settings: AnalysisSettings,
    temp_bounds: Vec<Bounds>,
    sampled: HashSet<(FunctionKind, usize)>,
    extremum_points: HashMap<usize, Vec<f64>>,
    histograms: HashMap<HistType, Histogram>,
}

impl MockAnalysis {
    fn new(problem: Arc<MockProblem>) -> Self {
        let histograms = HistType::ALL
            .into_iter()
            .map(|h| (h, Histogram::new(&h.default_bins())))
            .collect();
        let mut analysis = Self {
            problem,
            settings: AnalysisSettings::default(),
            temp_bounds: Vec::new(),
            sampled: HashSet::new(),
            extremum_points: HashMap::new(),
            histograms,
        };
        analysis.restore_original_bounds();
        analysis
    }

    fn restore_original_bounds(&mut self) {
        let inf = self.settings.infinity;
        self.temp_bounds = self
            .problem
            .variables
            .iter()
            .map(|v| Bounds::new(v.bounds.lower.clamp(-inf, inf), v.bounds.upper.clamp(-inf, inf)))
            .collect();
    }

    fn temp_bounds_at(&self, variable: usize) -> Result<Bounds> {
        self.temp_bounds
            .get(variable)
            .copied()
            .ok_or(WorkshopError::IndexOutOfRange {
                kind: "variable",
                index: variable,
                len: self.temp_bounds.len(),
            })
    }

    fn check_results(&self, kind: FunctionKind, index: usize) -> Result<()> {
        if self.problem.fails(MockFailure::Results(kind, index)) {
            return Err(WorkshopError::Library(format!(
                "result query failed for {} {}",
                kind.noun(),
                index
            )));
        }
        Ok(())
    }

    /// Scripted outcome once sampled, "not available" before
    fn reveal<T: Clone>(&self, kind: FunctionKind, index: usize, scripted: &Outcome<T>) -> Outcome<T> {
        if self.sampled.contains(&(kind, index)) {
            scripted.clone()
        } else {
            Outcome::Status(ResultStatus::NotAvailable)
        }
    }

    fn feed_histograms(&mut self, variables: &[usize]) -> Result<()> {
        for hist in self.histograms.values_mut() {
            hist.reset();
        }
        for &v in variables {
            let bounds = self.temp_bounds_at(v)?;
            let length = (bounds.upper - bounds.lower).min(self.settings.line_length_max);
            let points = [
                (HistType::FunctionValue, bounds.lower),
                (HistType::FunctionValue, bounds.upper),
                (HistType::LineLength, length),
                (
                    HistType::Slope,
                    if length > 0.0 {
                        (bounds.upper - bounds.lower).abs() / length
                    } else {
                        0.0
                    },
                ),
                (HistType::Shape, 0.0),
            ];
            for (hist, point) in points {
                if let Some(h) = self.histograms.get_mut(&hist) {
                    h.accumulate(point);
                }
            }
        }
        Ok(())
    }
}

impl AnalysisBackend for MockAnalysis {
    fn sample(&mut self, kind: FunctionKind, index: usize, extra_histograms: bool) -> Result<()> {
        if let Some(hook) = &self.problem.sample_hook {
            hook(kind, index);
        }
        if !self.problem.sample_delay.is_zero() {
            std::thread::sleep(self.problem.sample_delay);
        }
        if self.problem.fails(MockFailure::Sampling(kind, index)) {
            return Err(WorkshopError::Library(format!(
                "sampling failed for {} {}",
                kind.noun(),
                index
            )));
        }

        let variables = self.problem.function_variables(kind, index)?.to_vec();
        if extra_histograms {
            self.feed_histograms(&variables)?;
        }
        if kind == FunctionKind::Objective {
            let point = self
                .temp_bounds
                .iter()
                .map(|b| 0.5 * (b.lower + b.upper))
                .collect();
            self.extremum_points.insert(index, point);
        }
        self.sampled.insert((kind, index));
        Ok(())
    }

    fn bounds(&self, variable: usize) -> Result<Bounds> {
        self.temp_bounds_at(variable)
    }

    fn set_bounds(&mut self, variable: usize, bounds: Bounds) -> Result<()> {
        let len = self.temp_bounds.len();
        let slot = self
            .temp_bounds
            .get_mut(variable)
            .ok_or(WorkshopError::IndexOutOfRange {
                kind: "variable",
                index: variable,
                len,
            })?;
        *slot = bounds;
        Ok(())
    }

    fn reset_bounds(&mut self) -> Result<()> {
        self.restore_original_bounds();
        Ok(())
    }

    fn settings(&self) -> Result<AnalysisSettings> {
        Ok(self.settings.clone())
    }

    fn apply_settings(&mut self, settings: &AnalysisSettings) -> Result<()> {
        settings.validate()?;
        let grew = settings.infinity > self.settings.infinity;
        self.settings = settings.clone();
        if grew {
            self.restore_original_bounds();
        } else {
            let inf = self.settings.infinity;
            for b in &mut self.temp_bounds {
                b.lower = b.lower.clamp(-inf, inf);
                b.upper = b.upper.clamp(-inf, inf);
            }
        }
        Ok(())
    }

    fn empirical_shape(&self, kind: FunctionKind, index: usize) -> Result<Outcome<EmpiricalShape>> {
        self.check_results(kind, index)?;
        let scripted = match kind {
            FunctionKind::Constraint => &self.problem.constraint_at(index)?.empirical,
            FunctionKind::Objective => &self.problem.objective_at(index)?.empirical,
        };
        Ok(self.reveal(kind, index, scripted))
    }

    fn region_effect(&self, constraint: usize) -> Result<Outcome<RegionEffect>> {
        self.check_results(FunctionKind::Constraint, constraint)?;
        let c = self.problem.constraint_at(constraint)?;
        Ok(self.reveal(FunctionKind::Constraint, constraint, &c.region))
    }

    fn optimum_effect(&self, objective: usize) -> Result<Outcome<OptimumEffect>> {
        self.check_results(FunctionKind::Objective, objective)?;
        let o = self.problem.objective_at(objective)?;
        Ok(self.reveal(FunctionKind::Objective, objective, &o.optimum))
    }

    fn effectiveness(&self, constraint: usize) -> Result<Outcome<(f64, f64)>> {
        self.check_results(FunctionKind::Constraint, constraint)?;
        let c = self.problem.constraint_at(constraint)?;
        Ok(self.reveal(FunctionKind::Constraint, constraint, &c.effectiveness))
    }

    fn extremum(&self, objective: usize) -> Result<Outcome<f64>> {
        self.check_results(FunctionKind::Objective, objective)?;
        let o = self.problem.objective_at(objective)?;
        Ok(self.reveal(FunctionKind::Objective, objective, &o.extremum))
    }

    fn extremum_point(&self, objective: usize) -> Result<Outcome<Vec<f64>>> {
        self.check_results(FunctionKind::Objective, objective)?;
        let o = self.problem.objective_at(objective)?;
        let outcome = self.reveal(FunctionKind::Objective, objective, &o.extremum);
        Ok(match outcome {
            Outcome::Computed(_) => match self.extremum_points.get(&objective) {
                Some(point) => Outcome::Computed(point.clone()),
                None => Outcome::Status(ResultStatus::NotAvailable),
            },
            Outcome::Status(status) => Outcome::Status(status),
        })
    }

    fn histogram(&self, hist: HistType) -> Result<HistogramStats> {
        self.histograms
            .get(&hist)
            .map(Histogram::stats)
            .ok_or_else(|| WorkshopError::Library(format!("no {} histogram", hist)))
    }

    fn set_histogram_bins(&mut self, hist: HistType, layout: &BinLayout) -> Result<()> {
        layout.validate()?;
        self.histograms
            .entry(hist)
            .and_modify(|h| h.set_bins(layout))
            .or_insert_with(|| Histogram::new(layout));
        Ok(())
    }
}
