//! Cell values produced by the table adapters
//!
//! A cell is either a typed value or one of the sentinels: empty while the
//! problem or analysis is unloaded, unavailable while a result is missing or
//! being computed, and error when the library call behind it failed.

use crate::types::{
    ConstraintType, EmpiricalShape, FunctionShape, ObjectiveType, OptimumEffect, RegionEffect,
    ResultStatus, VariableType,
};
use std::fmt;

/// Text shown for cells whose result is being computed
pub const IN_PROGRESS_TEXT: &str = "Analysis in progress";

/// Text shown for cells whose library call failed
pub const ERROR_TEXT: &str = "Error";

/// Why an analysis-derived cell has no value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableReason {
    /// A background analysis is running or holds the handle
    InProgress,
    /// The function has not been analysed yet
    NotComputed,
    /// Too few sample points were gathered
    InsufficientData,
    /// Too many evaluations failed
    TooManyErrors,
}

impl From<ResultStatus> for UnavailableReason {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::InsufficientDataPoints => UnavailableReason::InsufficientData,
            ResultStatus::TooManyErrors => UnavailableReason::TooManyErrors,
            ResultStatus::NotAvailable | ResultStatus::Computed => UnavailableReason::NotComputed,
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::InProgress => f.write_str(IN_PROGRESS_TEXT),
            UnavailableReason::NotComputed => write!(f, "{}", ResultStatus::NotAvailable),
            UnavailableReason::InsufficientData => {
                write!(f, "{}", ResultStatus::InsufficientDataPoints)
            }
            UnavailableReason::TooManyErrors => write!(f, "{}", ResultStatus::TooManyErrors),
        }
    }
}

/// Enumerated domain values a cell can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumValue {
    VariableType(VariableType),
    ObjectiveType(ObjectiveType),
    ConstraintType(ConstraintType),
    FunctionShape(FunctionShape),
    EmpiricalShape(EmpiricalShape),
    RegionEffect(RegionEffect),
    OptimumEffect(OptimumEffect),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::VariableType(v) => v.fmt(f),
            EnumValue::ObjectiveType(v) => v.fmt(f),
            EnumValue::ConstraintType(v) => v.fmt(f),
            EnumValue::FunctionShape(v) => v.fmt(f),
            EnumValue::EmpiricalShape(v) => v.fmt(f),
            EnumValue::RegionEffect(v) => v.fmt(f),
            EnumValue::OptimumEffect(v) => v.fmt(f),
        }
    }
}

/// Content of one table cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Problem or analysis not loaded
    Empty,
    /// Result missing or being computed
    Unavailable(UnavailableReason),
    /// The library call behind the cell failed
    Error,
    Text(String),
    Integer(i64),
    Real(f64),
    Enum(EnumValue),
}

impl CellValue {
    /// True for `Empty`, `Unavailable` and `Error`
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            CellValue::Empty | CellValue::Unavailable(_) | CellValue::Error
        )
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            CellValue::Real(v) => Some(*v),
            CellValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer cell holding a row index
    pub fn index(value: usize) -> Self {
        CellValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<EnumValue> for CellValue {
    fn from(value: EnumValue) -> Self {
        CellValue::Enum(value)
    }
}

macro_rules! enum_cell {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for EnumValue {
                fn from(value: $ty) -> Self {
                    EnumValue::$ty(value)
                }
            }

            impl From<$ty> for CellValue {
                fn from(value: $ty) -> Self {
                    CellValue::Enum(EnumValue::$ty(value))
                }
            }
        )*
    };
}

enum_cell!(
    VariableType,
    ObjectiveType,
    ConstraintType,
    FunctionShape,
    EmpiricalShape,
    RegionEffect,
    OptimumEffect
);

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Unavailable(reason) => reason.fmt(f),
            CellValue::Error => f.write_str(ERROR_TEXT),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Real(v) => write!(f, "{}", v),
            CellValue::Enum(v) => v.fmt(f),
        }
    }
}
