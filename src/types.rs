//! Core domain types for the MProbe workshop
//!
//! This module contains the enumerations and small value types that the
//! analysis library hands back through its handle API, together with their
//! native single-byte codes and their display text.
//!
//! # Main Types
//!
//! - [`VariableType`], [`ObjectiveType`], [`ConstraintType`] - static problem definition
//! - [`FunctionKind`], [`FunctionShape`] - which function a query is about, and its algebraic shape
//! - [`ResultStatus`] and [`Outcome`] - whether an analysis result has been computed
//! - [`EmpiricalShape`], [`RegionEffect`], [`OptimumEffect`] - analysis classifications
//! - [`Effectiveness`] - constraint effectiveness split over both bounds
//!
//! # Native Codes
//!
//! Every enum converts from the code the library returns via `from_code`.
//! Classification codes that coincide with a non-computed [`ResultStatus`]
//! decode to [`Outcome::Status`] instead of a classification.

use crate::error::{Result, WorkshopError};
use std::fmt;

/// Type of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    Real,
    Integer,
    Binary,
}

impl VariableType {
    pub const ALL: [VariableType; 3] = [
        VariableType::Real,
        VariableType::Integer,
        VariableType::Binary,
    ];

    /// Decode the library's variable type code
    pub fn from_code(code: i32) -> Result<Self> {
        match u8::try_from(code).map(char::from) {
            Ok('r') => Ok(VariableType::Real),
            Ok('i') => Ok(VariableType::Integer),
            Ok('b') => Ok(VariableType::Binary),
            _ => Err(WorkshopError::UnexpectedCode {
                what: "variable type",
                code,
            }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            VariableType::Real => b'r',
            VariableType::Integer => b'i',
            VariableType::Binary => b'b',
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::Real => write!(f, "Real"),
            VariableType::Integer => write!(f, "Integer"),
            VariableType::Binary => write!(f, "Binary"),
        }
    }
}

/// Optimisation direction of an objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectiveType {
    Maximize,
    Minimize,
}

impl ObjectiveType {
    pub fn from_code(code: i32) -> Result<Self> {
        match u8::try_from(code).map(char::from) {
            Ok('M') => Ok(ObjectiveType::Maximize),
            Ok('m') => Ok(ObjectiveType::Minimize),
            _ => Err(WorkshopError::UnexpectedCode {
                what: "objective type",
                code,
            }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ObjectiveType::Maximize => b'M',
            ObjectiveType::Minimize => b'm',
        }
    }
}

impl fmt::Display for ObjectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveType::Maximize => write!(f, "Maximize"),
            ObjectiveType::Minimize => write!(f, "Minimize"),
        }
    }
}

/// Kind of bound structure on a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    Range,
    Equality,
    LessOrEqual,
    GreaterOrEqual,
    Unconstraining,
}

impl ConstraintType {
    pub fn from_code(code: i32) -> Result<Self> {
        match u8::try_from(code).map(char::from) {
            Ok('r') => Ok(ConstraintType::Range),
            Ok('e') => Ok(ConstraintType::Equality),
            Ok('l') => Ok(ConstraintType::LessOrEqual),
            Ok('g') => Ok(ConstraintType::GreaterOrEqual),
            Ok('u') => Ok(ConstraintType::Unconstraining),
            _ => Err(WorkshopError::UnexpectedCode {
                what: "constraint type",
                code,
            }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ConstraintType::Range => b'r',
            ConstraintType::Equality => b'e',
            ConstraintType::LessOrEqual => b'l',
            ConstraintType::GreaterOrEqual => b'g',
            ConstraintType::Unconstraining => b'u',
        }
    }

    /// One-sided constraints
    pub fn is_inequality(&self) -> bool {
        matches!(
            self,
            ConstraintType::LessOrEqual | ConstraintType::GreaterOrEqual
        )
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::Range => write!(f, "Range"),
            ConstraintType::Equality => write!(f, "Equality"),
            ConstraintType::LessOrEqual => write!(f, "Less or equal"),
            ConstraintType::GreaterOrEqual => write!(f, "Greater or equal"),
            ConstraintType::Unconstraining => write!(f, "Unconstraining"),
        }
    }
}

/// Which family of functions a query addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Objective,
    Constraint,
}

impl FunctionKind {
    pub fn code(&self) -> u8 {
        match self {
            FunctionKind::Objective => b'o',
            FunctionKind::Constraint => b'c',
        }
    }

    /// Lowercase noun used in progress and log messages
    pub fn noun(&self) -> &'static str {
        match self {
            FunctionKind::Objective => "objective",
            FunctionKind::Constraint => "constraint",
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::Objective => write!(f, "Objective"),
            FunctionKind::Constraint => write!(f, "Constraint"),
        }
    }
}

/// Algebraic shape derived from the symbolic function definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionShape {
    Linear,
    Quadratic,
    Nonlinear,
}

impl FunctionShape {
    pub const ALL: [FunctionShape; 3] = [
        FunctionShape::Linear,
        FunctionShape::Quadratic,
        FunctionShape::Nonlinear,
    ];

    pub fn from_code(code: i32) -> Result<Self> {
        match u8::try_from(code).map(char::from) {
            Ok('l') => Ok(FunctionShape::Linear),
            Ok('q') => Ok(FunctionShape::Quadratic),
            Ok('n') => Ok(FunctionShape::Nonlinear),
            _ => Err(WorkshopError::UnexpectedCode {
                what: "function shape",
                code,
            }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            FunctionShape::Linear => b'l',
            FunctionShape::Quadratic => b'q',
            FunctionShape::Nonlinear => b'n',
        }
    }
}

impl fmt::Display for FunctionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionShape::Linear => write!(f, "Linear"),
            FunctionShape::Quadratic => write!(f, "Quadratic"),
            FunctionShape::Nonlinear => write!(f, "Nonlinear"),
        }
    }
}

/// Whether an analysis result exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultStatus {
    NotAvailable,
    InsufficientDataPoints,
    TooManyErrors,
    Computed,
}

impl ResultStatus {
    pub fn from_code(code: i32) -> Result<Self> {
        match u8::try_from(code).map(char::from) {
            Ok('n') => Ok(ResultStatus::NotAvailable),
            Ok('i') => Ok(ResultStatus::InsufficientDataPoints),
            Ok('e') => Ok(ResultStatus::TooManyErrors),
            Ok('y') => Ok(ResultStatus::Computed),
            _ => Err(WorkshopError::UnexpectedCode {
                what: "result status",
                code,
            }),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ResultStatus::NotAvailable => b'n',
            ResultStatus::InsufficientDataPoints => b'i',
            ResultStatus::TooManyErrors => b'e',
            ResultStatus::Computed => b'y',
        }
    }

    /// Decode a status code only if it is one of the non-computed statuses
    fn pending_from_code(code: i32) -> Option<Self> {
        match ResultStatus::from_code(code) {
            Ok(ResultStatus::Computed) | Err(_) => None,
            Ok(status) => Some(status),
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::NotAvailable => write!(f, "Not available"),
            ResultStatus::InsufficientDataPoints => write!(f, "Insufficient data points"),
            ResultStatus::TooManyErrors => write!(f, "Too many errors"),
            ResultStatus::Computed => write!(f, "Computed"),
        }
    }
}

/// A value the library may not have computed yet
///
/// `Status` never carries [`ResultStatus::Computed`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Computed(T),
    Status(ResultStatus),
}

impl<T> Outcome<T> {
    /// Build from a status code plus the value that goes with it
    pub fn from_status(status: ResultStatus, value: T) -> Self {
        match status {
            ResultStatus::Computed => Outcome::Computed(value),
            other => Outcome::Status(other),
        }
    }

    pub fn computed(self) -> Option<T> {
        match self {
            Outcome::Computed(value) => Some(value),
            Outcome::Status(_) => None,
        }
    }

    pub fn status(&self) -> ResultStatus {
        match self {
            Outcome::Computed(_) => ResultStatus::Computed,
            Outcome::Status(status) => *status,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Computed(value) => Outcome::Computed(f(value)),
            Outcome::Status(status) => Outcome::Status(status),
        }
    }
}

/// Shape classification derived from sampled function behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmpiricalShape {
    Linear,
    AlmostLinearBoth,
    AlmostLinearConvex,
    AlmostLinearConcave,
    Convex,
    AlmostConvex,
    Concave,
    AlmostConcave,
    ConvexAndConcave,
}

impl EmpiricalShape {
    pub const ALL: [EmpiricalShape; 9] = [
        EmpiricalShape::Linear,
        EmpiricalShape::AlmostLinearBoth,
        EmpiricalShape::AlmostLinearConvex,
        EmpiricalShape::AlmostLinearConcave,
        EmpiricalShape::Convex,
        EmpiricalShape::AlmostConvex,
        EmpiricalShape::Concave,
        EmpiricalShape::AlmostConcave,
        EmpiricalShape::ConvexAndConcave,
    ];

    pub fn from_code(code: i32) -> Result<Outcome<Self>> {
        if let Some(status) = ResultStatus::pending_from_code(code) {
            return Ok(Outcome::Status(status));
        }
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .map(Outcome::Computed)
            .ok_or(WorkshopError::UnexpectedCode {
                what: "empirical shape",
                code,
            })
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for EmpiricalShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EmpiricalShape::Linear => "Linear",
            EmpiricalShape::AlmostLinearBoth => "Almost linear: Convex and concave",
            EmpiricalShape::AlmostLinearConvex => "Almost linear: Convex",
            EmpiricalShape::AlmostLinearConcave => "Almost linear: Concave",
            EmpiricalShape::Convex => "Convex",
            EmpiricalShape::AlmostConvex => "Almost convex",
            EmpiricalShape::Concave => "Concave",
            EmpiricalShape::AlmostConcave => "Almost concave",
            EmpiricalShape::ConvexAndConcave => "Convex and concave",
        };
        f.write_str(text)
    }
}

/// Effect of a constraint on the convexity of the feasible region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionEffect {
    Convex,
    Nonconvex,
    AlmostConvex,
}

impl RegionEffect {
    const ALL: [RegionEffect; 3] = [
        RegionEffect::Convex,
        RegionEffect::Nonconvex,
        RegionEffect::AlmostConvex,
    ];

    pub fn from_code(code: i32) -> Result<Outcome<Self>> {
        if let Some(status) = ResultStatus::pending_from_code(code) {
            return Ok(Outcome::Status(status));
        }
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .map(Outcome::Computed)
            .ok_or(WorkshopError::UnexpectedCode {
                what: "region effect",
                code,
            })
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for RegionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionEffect::Convex => write!(f, "Convex"),
            RegionEffect::Nonconvex => write!(f, "Nonconvex"),
            RegionEffect::AlmostConvex => write!(f, "Almost convex"),
        }
    }
}

/// Whether an objective's best found optimum is local or global
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimumEffect {
    Local,
    Global,
    AlmostGlobal,
}

impl OptimumEffect {
    const ALL: [OptimumEffect; 3] = [
        OptimumEffect::Local,
        OptimumEffect::Global,
        OptimumEffect::AlmostGlobal,
    ];

    pub fn from_code(code: i32) -> Result<Outcome<Self>> {
        if let Some(status) = ResultStatus::pending_from_code(code) {
            return Ok(Outcome::Status(status));
        }
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .map(Outcome::Computed)
            .ok_or(WorkshopError::UnexpectedCode {
                what: "optimum effect",
                code,
            })
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OptimumEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimumEffect::Local => write!(f, "Local"),
            OptimumEffect::Global => write!(f, "Global"),
            OptimumEffect::AlmostGlobal => write!(f, "Almost Global"),
        }
    }
}

/// Lower/upper bound pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Inclusive containment
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn is_reversed(&self) -> bool {
        self.lower > self.upper
    }
}

/// Constraint effectiveness as computed by the library
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effectiveness {
    pub status: ResultStatus,
    pub constraint_type: ConstraintType,
    lower: f64,
    upper: f64,
}

impl Effectiveness {
    pub fn new(status: ResultStatus, constraint_type: ConstraintType, lower: f64, upper: f64) -> Self {
        Self {
            status,
            constraint_type,
            lower,
            upper,
        }
    }

    fn computed(&self, value: f64) -> Option<f64> {
        (self.status == ResultStatus::Computed).then_some(value)
    }

    pub fn total(&self) -> Option<f64> {
        self.computed(self.lower + self.upper)
    }

    pub fn lower_bound(&self) -> Option<f64> {
        self.computed(self.lower)
    }

    pub fn upper_bound(&self) -> Option<f64> {
        self.computed(self.upper)
    }

    /// Fraction of samples that satisfied the constraint
    pub fn ineffectiveness(&self) -> Option<f64> {
        self.computed(1.0 - (self.lower + self.upper))
    }
}

impl fmt::Display for Effectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = match self.total() {
            Some(total) => total,
            None => return write!(f, "{}", self.status),
        };
        if self.constraint_type == ConstraintType::Equality && total <= 0.999 {
            write!(
                f,
                "Possible. LT: {} EQ: {} GT: {}",
                self.lower,
                1.0 - total,
                self.upper
            )
        } else {
            write!(f, "{}", total)
        }
    }
}

/// Functions that reference a variable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub constraints: Vec<usize>,
    pub objectives: Vec<usize>,
}

impl Presence {
    pub fn function_count(&self) -> usize {
        self.constraints.len() + self.objectives.len()
    }
}
