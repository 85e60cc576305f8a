//! Static column schemas for the three entity tables
//!
//! Each table has a fixed schema: a const array of [`ColumnDescriptor`]s and
//! a column enum whose discriminant is the index into that array. Lookups
//! index the array directly.

use std::fmt;

/// Type of the values a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Enumerated,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Integer => write!(f, "integer"),
            ColumnKind::Real => write!(f, "real"),
            ColumnKind::Enumerated => write!(f, "enumerated"),
        }
    }
}

/// One column of a table schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub index: usize,
    pub header: &'static str,
    pub kind: ColumnKind,
    /// Values come from the analysis handle and read as in progress while
    /// an analysis runs
    pub analysis_derived: bool,
}

const fn col(index: usize, header: &'static str, kind: ColumnKind) -> ColumnDescriptor {
    ColumnDescriptor {
        index,
        header,
        kind,
        analysis_derived: false,
    }
}

const fn analysis_col(index: usize, header: &'static str, kind: ColumnKind) -> ColumnDescriptor {
    ColumnDescriptor {
        index,
        header,
        kind,
        analysis_derived: true,
    }
}

macro_rules! column_enum {
    ($(#[$meta:meta])* $name:ident, $schema:ident, [$($variant:ident),* $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            pub const fn index(self) -> usize {
                self as usize
            }

            pub const fn descriptor(self) -> &'static ColumnDescriptor {
                &$schema[self as usize]
            }
        }
    };
}

use ColumnKind::{Enumerated, Integer, Real, Text};

pub const VARIABLE_SCHEMA: [ColumnDescriptor; 9] = [
    col(0, "Name", Text),
    col(1, "Id.", Integer),
    col(2, "Type", Enumerated),
    col(3, "# funcs.", Integer),
    col(4, "Orig. lwr bound", Real),
    analysis_col(5, "Tmp. lwr bound", Real),
    analysis_col(6, "Tmp. uppr bound", Real),
    col(7, "Orig. uppr bound", Real),
    analysis_col(8, "Obj. best. pt.", Real),
];

column_enum!(
    /// Columns of the variable table
    VariableColumn,
    VARIABLE_SCHEMA,
    [
        Name,
        Id,
        Type,
        FunctionCount,
        OrigLower,
        TmpLower,
        TmpUpper,
        OrigUpper,
        BestPoint,
    ]
);

pub const CONSTRAINT_SCHEMA: [ColumnDescriptor; 15] = [
    col(0, "Name", Text),
    col(1, "Id.", Integer),
    col(2, "Type", Enumerated),
    col(3, "Lower bound", Real),
    col(4, "Upper bound", Real),
    col(5, "Alg. shape", Enumerated),
    analysis_col(6, "Emp. shape", Enumerated),
    analysis_col(7, "Reg. effect", Enumerated),
    analysis_col(8, "Total eff.", Real),
    analysis_col(9, "LB eff.", Real),
    analysis_col(10, "UB eff.", Real),
    analysis_col(11, "Satisfied", Real),
    col(12, "Total vars.", Integer),
    col(13, "Real vars.", Integer),
    col(14, "Binary vars.", Integer),
];

column_enum!(
    /// Columns of the constraint table
    ConstraintColumn,
    CONSTRAINT_SCHEMA,
    [
        Name,
        Id,
        Type,
        LowerBound,
        UpperBound,
        AlgebraicShape,
        EmpiricalShape,
        RegionEffect,
        TotalEffectiveness,
        LowerEffectiveness,
        UpperEffectiveness,
        Satisfied,
        TotalVariables,
        RealVariables,
        BinaryVariables,
    ]
);

pub const OBJECTIVE_SCHEMA: [ColumnDescriptor; 11] = [
    col(0, "Name", Text),
    col(1, "Id.", Integer),
    col(2, "Type", Enumerated),
    col(3, "Alg. shape", Enumerated),
    analysis_col(4, "Emp. shape", Enumerated),
    analysis_col(5, "Optimum eff.", Enumerated),
    analysis_col(6, "Best value", Real),
    col(7, "Total vars.", Integer),
    col(8, "Real vars.", Integer),
    col(9, "Int. + Bin. vars.", Integer),
    col(10, "Binary vars.", Integer),
];

column_enum!(
    /// Columns of the objective table
    ObjectiveColumn,
    OBJECTIVE_SCHEMA,
    [
        Name,
        Id,
        Type,
        AlgebraicShape,
        EmpiricalShape,
        OptimumEffect,
        BestValue,
        TotalVariables,
        RealVariables,
        DiscreteVariables,
        BinaryVariables,
    ]
);
