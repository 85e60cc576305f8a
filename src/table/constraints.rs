//! Constraint table adapter

use crate::backend::{AnalysisBackend, ProblemBackend};
use crate::error::Result;
use crate::state::AnalysisState;
use crate::statistics::VariableCounts;
use crate::types::{Effectiveness, FunctionKind, Outcome, ResultStatus};
use std::sync::Arc;

use super::binding::{outcome_cell, StateBinding};
use super::column::{ColumnDescriptor, ConstraintColumn, CONSTRAINT_SCHEMA};
use super::value::{CellValue, UnavailableReason};
use super::{unknown_column, EntityKind, TableModel};

/// Constraints of the loaded problem
pub struct ConstraintTable {
    binding: StateBinding,
}

impl ConstraintTable {
    pub fn new(analysis: Arc<AnalysisState>) -> Self {
        Self {
            binding: StateBinding::new(analysis),
        }
    }

    /// Effectiveness rendered the way the library describes it
    ///
    /// Equality constraints that can be satisfied read as
    /// `Possible. LT: .. EQ: .. GT: ..`.
    pub fn effectiveness_text(&self, row: usize) -> CellValue {
        self.binding.analysis_cell(|p, a| {
            Ok(match effectiveness(p, a, row)? {
                Outcome::Computed(eff) => CellValue::Text(eff.to_string()),
                Outcome::Status(status) => CellValue::Unavailable(status.into()),
            })
        })
    }

    fn effectiveness_cell(&self, row: usize, pick: fn(&Effectiveness) -> Option<f64>) -> CellValue {
        self.binding.analysis_cell(|p, a| {
            let eff = match effectiveness(p, a, row)? {
                Outcome::Computed(eff) => eff,
                Outcome::Status(status) => return Ok(CellValue::Unavailable(status.into())),
            };
            Ok(pick(&eff)
                .map(CellValue::Real)
                .unwrap_or(CellValue::Unavailable(UnavailableReason::NotComputed)))
        })
    }

    fn counts_cell(&self, row: usize, pick: fn(&VariableCounts) -> usize) -> CellValue {
        self.binding.problem_cell(|p| {
            let counts = VariableCounts::of(p, &p.constraint_variables(row)?)?;
            Ok(CellValue::index(pick(&counts)))
        })
    }
}

fn effectiveness(
    problem: &dyn ProblemBackend,
    analysis: &dyn AnalysisBackend,
    row: usize,
) -> Result<Outcome<Effectiveness>> {
    let constraint_type = problem.constraint_type(row)?;
    Ok(analysis.effectiveness(row)?.map(|(lower, upper)| {
        Effectiveness::new(ResultStatus::Computed, constraint_type, lower, upper)
    }))
}

impl TableModel for ConstraintTable {
    fn kind(&self) -> EntityKind {
        EntityKind::Constraint
    }

    fn schema(&self) -> &'static [ColumnDescriptor] {
        &CONSTRAINT_SCHEMA
    }

    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn row_count(&self) -> usize {
        self.binding.row_count(|p| p.constraint_count())
    }

    fn value(&self, row: usize, column: usize) -> CellValue {
        use ConstraintColumn as C;

        let Some(column) = C::from_index(column) else {
            return unknown_column(self.kind(), column);
        };
        let b = &self.binding;
        let kind = FunctionKind::Constraint;
        match column {
            C::Name => b.problem_cell(|p| Ok(p.constraint_name(row)?.into())),
            C::Id => b.problem_cell(|_| Ok(CellValue::index(row))),
            C::Type => b.problem_cell(|p| Ok(p.constraint_type(row)?.into())),
            C::LowerBound => b.problem_cell(|p| Ok(p.constraint_bounds(row)?.lower.into())),
            C::UpperBound => b.problem_cell(|p| Ok(p.constraint_bounds(row)?.upper.into())),
            C::AlgebraicShape => b.problem_cell(|p| Ok(p.function_shape(kind, row)?.into())),
            C::EmpiricalShape => {
                b.analysis_cell(|_, a| Ok(outcome_cell(a.empirical_shape(kind, row)?)))
            }
            C::RegionEffect => b.analysis_cell(|_, a| Ok(outcome_cell(a.region_effect(row)?))),
            C::TotalEffectiveness => self.effectiveness_cell(row, Effectiveness::total),
            C::LowerEffectiveness => self.effectiveness_cell(row, Effectiveness::lower_bound),
            C::UpperEffectiveness => self.effectiveness_cell(row, Effectiveness::upper_bound),
            C::Satisfied => self.effectiveness_cell(row, Effectiveness::ineffectiveness),
            C::TotalVariables => self.counts_cell(row, |c| c.total),
            C::RealVariables => self.counts_cell(row, |c| c.real),
            C::BinaryVariables => self.counts_cell(row, |c| c.binary),
        }
    }

    fn identifier_column(&self) -> usize {
        ConstraintColumn::Id.index()
    }
}
