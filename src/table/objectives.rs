//! Objective table adapter

use crate::state::AnalysisState;
use crate::statistics::VariableCounts;
use crate::types::FunctionKind;
use std::sync::Arc;

use super::binding::{outcome_cell, StateBinding};
use super::column::{ColumnDescriptor, ObjectiveColumn, OBJECTIVE_SCHEMA};
use super::value::CellValue;
use super::{unknown_column, EntityKind, TableModel};

/// Objectives of the loaded problem
pub struct ObjectiveTable {
    binding: StateBinding,
}

impl ObjectiveTable {
    pub fn new(analysis: Arc<AnalysisState>) -> Self {
        Self {
            binding: StateBinding::new(analysis),
        }
    }

    fn counts_cell(&self, row: usize, pick: fn(&VariableCounts) -> usize) -> CellValue {
        self.binding.problem_cell(|p| {
            let counts = VariableCounts::of(p, &p.objective_variables(row)?)?;
            Ok(CellValue::index(pick(&counts)))
        })
    }
}

impl TableModel for ObjectiveTable {
    fn kind(&self) -> EntityKind {
        EntityKind::Objective
    }

    fn schema(&self) -> &'static [ColumnDescriptor] {
        &OBJECTIVE_SCHEMA
    }

    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn row_count(&self) -> usize {
        self.binding.row_count(|p| p.objective_count())
    }

    fn value(&self, row: usize, column: usize) -> CellValue {
        use ObjectiveColumn as O;

        let Some(column) = O::from_index(column) else {
            return unknown_column(self.kind(), column);
        };
        let b = &self.binding;
        let kind = FunctionKind::Objective;
        match column {
            O::Name => b.problem_cell(|p| Ok(p.objective_name(row)?.into())),
            O::Id => b.problem_cell(|_| Ok(CellValue::index(row))),
            O::Type => b.problem_cell(|p| Ok(p.objective_type(row)?.into())),
            O::AlgebraicShape => b.problem_cell(|p| Ok(p.function_shape(kind, row)?.into())),
            O::EmpiricalShape => {
                b.analysis_cell(|_, a| Ok(outcome_cell(a.empirical_shape(kind, row)?)))
            }
            O::OptimumEffect => b.analysis_cell(|_, a| Ok(outcome_cell(a.optimum_effect(row)?))),
            O::BestValue => b.analysis_cell(|_, a| Ok(outcome_cell(a.extremum(row)?))),
            O::TotalVariables => self.counts_cell(row, |c| c.total),
            O::RealVariables => self.counts_cell(row, |c| c.real),
            O::DiscreteVariables => self.counts_cell(row, VariableCounts::discrete),
            O::BinaryVariables => self.counts_cell(row, |c| c.binary),
        }
    }

    fn identifier_column(&self) -> usize {
        ObjectiveColumn::Id.index()
    }
}
