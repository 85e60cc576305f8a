//! Variable table adapter

use crate::error::{Result, WorkshopError};
use crate::state::AnalysisState;
use crate::types::{Bounds, Outcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::binding::StateBinding;
use super::column::{ColumnDescriptor, VariableColumn, VARIABLE_SCHEMA};
use super::value::CellValue;
use super::{read_only, unknown_column, EntityKind, TableModel};

/// Message shown when an edited temporary bound is rejected
pub const BOUNDS_ERROR: &str =
    "ERROR! New bounds may be outside original bounds or temporary bounds are reversed!";

/// Variables of the loaded problem
///
/// The temporary bound columns are editable. The best-point column shows the
/// coordinate of the best point found for the selected objective.
pub struct VariableTable {
    binding: StateBinding,
    best_point_objective: AtomicUsize,
}

impl VariableTable {
    pub fn new(analysis: Arc<AnalysisState>) -> Self {
        Self {
            binding: StateBinding::new(analysis),
            best_point_objective: AtomicUsize::new(0),
        }
    }

    /// Objective whose best point fills the `Obj. best. pt.` column
    pub fn best_point_objective(&self) -> usize {
        self.best_point_objective.load(Ordering::Relaxed)
    }

    pub fn set_objective_for_best_point(&self, objective: usize) {
        self.best_point_objective.store(objective, Ordering::Relaxed);
        self.binding.invalidate();
    }

    fn best_point(&self, row: usize) -> CellValue {
        let objective = self.best_point_objective();
        self.binding.analysis_cell(|problem, analysis| {
            if objective >= problem.objective_count()? {
                return Ok(CellValue::Real(f64::NAN));
            }
            let coordinate = match analysis.extremum_point(objective)? {
                Outcome::Computed(point) => point.get(row).copied().unwrap_or(f64::NAN),
                Outcome::Status(_) => f64::NAN,
            };
            Ok(CellValue::Real(coordinate))
        })
    }

    /// Validate and commit a temporary bound
    ///
    /// The current temporary bounds are read and replaced under one lock of
    /// the analysis handle, so a task started meanwhile cannot interleave.
    fn set_temporary_bound(&self, row: usize, column: VariableColumn, value: f64) -> Result<()> {
        let analysis = self.binding.analysis_state();
        if analysis.is_analysing() {
            return Err(analysing_error());
        }
        let original = self.binding.problem_state().require()?.variable_bounds(row)?;

        let result = analysis.update_bounds(row, |temporary| {
            let (valid, updated) = match column {
                VariableColumn::TmpLower => (
                    original.lower <= value && value <= temporary.upper,
                    Bounds::new(value, temporary.upper),
                ),
                _ => (
                    temporary.lower <= value && value <= original.upper,
                    Bounds::new(temporary.lower, value),
                ),
            };
            if !valid {
                tracing::debug!(
                    "Rejected bound {} for variable {} (original [{}, {}], temporary [{}, {}])",
                    value,
                    row,
                    original.lower,
                    original.upper,
                    temporary.lower,
                    temporary.upper
                );
                return Err(WorkshopError::Validation(BOUNDS_ERROR.to_string()));
            }
            Ok(updated)
        });
        match result {
            Err(WorkshopError::Busy) => Err(analysing_error()),
            other => other,
        }
    }
}

fn analysing_error() -> WorkshopError {
    WorkshopError::Validation(
        "Temporary bounds cannot change while an analysis is running".to_string(),
    )
}

impl TableModel for VariableTable {
    fn kind(&self) -> EntityKind {
        EntityKind::Variable
    }

    fn schema(&self) -> &'static [ColumnDescriptor] {
        &VARIABLE_SCHEMA
    }

    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn row_count(&self) -> usize {
        self.binding.row_count(|p| p.variable_count())
    }

    fn value(&self, row: usize, column: usize) -> CellValue {
        let Some(column) = VariableColumn::from_index(column) else {
            return unknown_column(self.kind(), column);
        };
        let b = &self.binding;
        match column {
            VariableColumn::Name => b.problem_cell(|p| Ok(p.variable_name(row)?.into())),
            VariableColumn::Id => b.problem_cell(|_| Ok(CellValue::index(row))),
            VariableColumn::Type => b.problem_cell(|p| Ok(p.variable_type(row)?.into())),
            VariableColumn::FunctionCount => {
                b.problem_cell(|p| Ok(CellValue::index(p.variable_presence(row)?.function_count())))
            }
            VariableColumn::OrigLower => b.problem_cell(|p| Ok(p.variable_bounds(row)?.lower.into())),
            VariableColumn::OrigUpper => b.problem_cell(|p| Ok(p.variable_bounds(row)?.upper.into())),
            VariableColumn::TmpLower => b.analysis_cell(|_, a| Ok(a.bounds(row)?.lower.into())),
            VariableColumn::TmpUpper => b.analysis_cell(|_, a| Ok(a.bounds(row)?.upper.into())),
            VariableColumn::BestPoint => self.best_point(row),
        }
    }

    fn identifier_column(&self) -> usize {
        VariableColumn::Id.index()
    }

    fn is_editable(&self, row: usize, column: usize) -> bool {
        matches!(
            VariableColumn::from_index(column),
            Some(VariableColumn::TmpLower | VariableColumn::TmpUpper)
        ) && self.binding.analysis_state().is_loaded()
            && !self.binding.analysis_state().is_analysing()
            && row < self.row_count()
    }

    fn set_value(&self, row: usize, column: usize, value: CellValue) -> Result<()> {
        let target = match VariableColumn::from_index(column) {
            Some(c @ (VariableColumn::TmpLower | VariableColumn::TmpUpper)) => c,
            _ => return Err(read_only(self.kind(), self.column(column), row)),
        };
        let value = value
            .as_real()
            .ok_or_else(|| WorkshopError::Validation(format!("'{}' is not a number", value)))?;
        self.set_temporary_bound(row, target, value)
    }
}

#[cfg(all(test, feature = "mock-library"))]
mod tests {
    use super::*;
    use crate::backend::{MockLibrary, MockProblem};
    use crate::state::ProblemState;
    use crate::table::UnavailableReason;
    use crate::types::{FunctionKind, VariableType};

    fn loaded() -> VariableTable {
        let problem = ProblemState::new();
        problem.set_problem(MockLibrary::open_problem(MockProblem::sample()));
        let analysis = AnalysisState::new(problem);
        analysis.rebind().unwrap();
        VariableTable::new(analysis)
    }

    fn col(c: VariableColumn) -> usize {
        c.index()
    }

    #[test]
    fn test_unloaded_table_is_empty() {
        let table = VariableTable::new(AnalysisState::new(ProblemState::new()));
        assert_eq!(table.row_count(), 0);
        for c in 0..table.column_count() {
            assert_eq!(table.value(0, c), CellValue::Empty);
        }
        assert!(!table.is_editable(0, col(VariableColumn::TmpLower)));
    }

    #[test]
    fn test_static_columns() {
        let table = loaded();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.value(2, col(VariableColumn::Name)), CellValue::Text("n".into()));
        assert_eq!(table.value(2, col(VariableColumn::Id)), CellValue::Integer(2));
        assert_eq!(
            table.value(3, col(VariableColumn::Type)),
            CellValue::from(VariableType::Binary)
        );
        // x appears in budget, balance, disc, wave and cost
        assert_eq!(table.value(0, col(VariableColumn::FunctionCount)), CellValue::Integer(5));
        assert_eq!(table.value(0, col(VariableColumn::OrigLower)), CellValue::Real(-10.0));
        assert_eq!(table.value(1, col(VariableColumn::TmpUpper)), CellValue::Real(5.0));
        assert_eq!(table.value(9, col(VariableColumn::Name)), CellValue::Error);
        assert_eq!(table.value(0, 42), CellValue::Error);
    }

    #[test]
    fn test_only_temporary_bounds_editable() {
        let table = loaded();
        let editable: Vec<usize> = (0..table.column_count())
            .filter(|&c| table.is_editable(0, c))
            .collect();
        assert_eq!(editable, vec![col(VariableColumn::TmpLower), col(VariableColumn::TmpUpper)]);
        assert!(!table.is_editable(4, col(VariableColumn::TmpLower)));

        let err = table
            .set_value(0, col(VariableColumn::Name), CellValue::Text("z".into()))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_lower_bound_above_upper_rejected() {
        let table = loaded();
        table
            .set_value(0, col(VariableColumn::TmpUpper), CellValue::Real(2.0))
            .unwrap();

        let err = table
            .set_value(0, col(VariableColumn::TmpLower), CellValue::Real(3.0))
            .unwrap_err();
        assert_eq!(err.to_string(), BOUNDS_ERROR);
        assert_eq!(table.value(0, col(VariableColumn::TmpLower)), CellValue::Real(-10.0));
        assert_eq!(table.value(0, col(VariableColumn::TmpUpper)), CellValue::Real(2.0));
    }

    #[test]
    fn test_bounds_outside_original_rejected() {
        let table = loaded();
        assert!(table
            .set_value(1, col(VariableColumn::TmpLower), CellValue::Real(-1.0))
            .is_err());
        assert!(table
            .set_value(1, col(VariableColumn::TmpUpper), CellValue::Real(6.0))
            .is_err());
        assert!(table
            .set_value(1, col(VariableColumn::TmpUpper), CellValue::Real(f64::NAN))
            .is_err());

        table
            .set_value(1, col(VariableColumn::TmpLower), CellValue::Real(1.0))
            .unwrap();
        table
            .set_value(1, col(VariableColumn::TmpUpper), CellValue::Integer(4))
            .unwrap();
        assert_eq!(table.value(1, col(VariableColumn::TmpLower)), CellValue::Real(1.0));
        assert_eq!(table.value(1, col(VariableColumn::TmpUpper)), CellValue::Real(4.0));
    }

    #[test]
    fn test_edits_rejected_while_analysing() {
        let table = loaded();
        let guard = table.binding().analysis_state().begin_analysis();
        assert!(!table.is_editable(0, col(VariableColumn::TmpLower)));
        assert!(table
            .set_value(0, col(VariableColumn::TmpLower), CellValue::Real(0.0))
            .is_err());
        assert_eq!(
            table.value(0, col(VariableColumn::TmpLower)),
            CellValue::Unavailable(UnavailableReason::InProgress)
        );
        drop(guard);
        assert_eq!(table.value(0, col(VariableColumn::TmpLower)), CellValue::Real(-10.0));
    }

    #[test]
    fn test_edit_racing_analysis_start_is_rejected() {
        let table = loaded();
        let analysis = Arc::clone(table.binding().analysis_state());
        let mut guard = None;
        let edit = analysis
            .with_handle(|_| {
                let state = Arc::clone(&analysis);
                let edit = std::thread::spawn(move || {
                    VariableTable::new(state).set_value(
                        0,
                        col(VariableColumn::TmpLower),
                        CellValue::Real(0.0),
                    )
                });
                // let the edit pass its early check and wait for the handle
                std::thread::sleep(std::time::Duration::from_millis(50));
                guard = Some(analysis.begin_analysis());
                Ok(edit)
            })
            .unwrap();

        let err = edit.join().unwrap().unwrap_err();
        assert!(err.is_validation());
        assert_ne!(err.to_string(), BOUNDS_ERROR);
        drop(guard);
        assert_eq!(analysis.bounds(0).unwrap(), Bounds::new(-10.0, 10.0));
    }

    #[test]
    fn test_best_point_follows_selected_objective() {
        let table = loaded();
        let events = table.subscribe();
        let best = col(VariableColumn::BestPoint);
        assert!(table.value(1, best).as_real().unwrap().is_nan());

        table
            .binding()
            .analysis_state()
            .with_handle(|a| a.sample(FunctionKind::Objective, 0, false))
            .unwrap();
        assert_eq!(table.value(1, best), CellValue::Real(2.5));

        table.set_objective_for_best_point(1);
        assert_eq!(events.drain().len(), 1);
        assert!(table.value(1, best).as_real().unwrap().is_nan());

        table.set_objective_for_best_point(7);
        assert!(table.value(1, best).as_real().unwrap().is_nan());
    }
}
