//! Binding between a table adapter and the two state holders
//!
//! A [`StateBinding`] subscribes to both holders when it is created. Cell reads
//! go through [`StateBinding::problem_cell`] and [`StateBinding::analysis_cell`],
//! which apply the sentinel policy in one place:
//!
//! - problem unloaded: [`CellValue::Empty`]
//! - analysis running or handle busy: [`UnavailableReason::InProgress`]
//! - backend call failed: [`CellValue::Error`], logged and swallowed

use crate::backend::{AnalysisBackend, ProblemBackend};
use crate::error::Result;
use crate::state::{AnalysisState, ChangeHub, ProblemState, ReadAccess, StateEvent, Subscription};
use crate::types::Outcome;
use std::sync::Arc;

use super::value::{CellValue, UnavailableReason};

/// Coarse change notification published by a table adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    /// Every cell and the row count may have changed
    DataChanged,
}

/// Subscriptions and cell-read policy shared by all table adapters
pub struct StateBinding {
    problem: Arc<ProblemState>,
    analysis: Arc<AnalysisState>,
    problem_events: Subscription<StateEvent>,
    analysis_events: Subscription<StateEvent>,
    hub: ChangeHub<TableEvent>,
}

impl StateBinding {
    pub fn new(analysis: Arc<AnalysisState>) -> Self {
        let problem = Arc::clone(analysis.problem_state());
        Self {
            problem_events: problem.subscribe(),
            analysis_events: analysis.subscribe(),
            problem,
            analysis,
            hub: ChangeHub::new(),
        }
    }

    pub fn problem_state(&self) -> &Arc<ProblemState> {
        &self.problem
    }

    pub fn analysis_state(&self) -> &Arc<AnalysisState> {
        &self.analysis
    }

    /// Drain pending holder events, re-publishing one `DataChanged` if any
    /// arrived
    pub fn refresh(&self) -> bool {
        let changed = !self.problem_events.drain().is_empty()
            | !self.analysis_events.drain().is_empty();
        if changed {
            self.invalidate();
        }
        changed
    }

    /// Publish `DataChanged` unconditionally
    pub fn invalidate(&self) {
        self.hub.publish(TableEvent::DataChanged);
    }

    pub fn subscribe(&self) -> Subscription<TableEvent> {
        self.hub.subscribe()
    }

    /// Entity count, zero while unloaded or when the count query fails
    pub fn row_count(&self, count: impl FnOnce(&dyn ProblemBackend) -> Result<usize>) -> usize {
        let Some(problem) = self.problem.problem() else {
            return 0;
        };
        count(problem.as_ref()).unwrap_or_else(|e| {
            tracing::warn!("Failed to read row count: {}", e);
            0
        })
    }

    /// Read a cell from the static problem definition
    pub fn problem_cell(
        &self,
        read: impl FnOnce(&dyn ProblemBackend) -> Result<CellValue>,
    ) -> CellValue {
        let Some(problem) = self.problem.problem() else {
            return CellValue::Empty;
        };
        read(problem.as_ref()).unwrap_or_else(|e| {
            tracing::warn!("Failed to read cell: {}", e);
            CellValue::Error
        })
    }

    /// Read a cell from the analysis handle without blocking
    ///
    /// `read` also receives the problem handle for lookups that need both.
    pub fn analysis_cell(
        &self,
        read: impl FnOnce(&dyn ProblemBackend, &dyn AnalysisBackend) -> Result<CellValue>,
    ) -> CellValue {
        let Some(problem) = self.problem.problem() else {
            return CellValue::Empty;
        };
        if self.analysis.is_analysing() {
            return CellValue::Unavailable(UnavailableReason::InProgress);
        }
        match self.analysis.try_read(|a| read(problem.as_ref(), a)) {
            ReadAccess::Unloaded => CellValue::Empty,
            ReadAccess::Busy => CellValue::Unavailable(UnavailableReason::InProgress),
            ReadAccess::Value(Ok(value)) => value,
            ReadAccess::Value(Err(e)) => {
                tracing::warn!("Failed to read analysis cell: {}", e);
                CellValue::Error
            }
        }
    }
}

/// Map a library outcome to a cell, statuses becoming unavailable sentinels
pub fn outcome_cell<T: Into<CellValue>>(outcome: Outcome<T>) -> CellValue {
    match outcome {
        Outcome::Computed(value) => value.into(),
        Outcome::Status(status) => CellValue::Unavailable(status.into()),
    }
}

#[cfg(all(test, feature = "mock-library"))]
mod tests {
    use super::*;
    use crate::backend::{MockLibrary, MockProblem};
    use crate::error::WorkshopError;
    use crate::types::{FunctionKind, ResultStatus};

    fn bound() -> StateBinding {
        let problem = ProblemState::new();
        StateBinding::new(AnalysisState::new(problem))
    }

    #[test]
    fn test_unloaded_reads_empty() {
        let binding = bound();
        assert_eq!(binding.row_count(|p| p.variable_count()), 0);
        assert_eq!(
            binding.problem_cell(|p| Ok(CellValue::Text(p.variable_name(0)?))),
            CellValue::Empty
        );
        assert_eq!(binding.analysis_cell(|_, _| Ok(CellValue::Real(1.0))), CellValue::Empty);
    }

    #[test]
    fn test_failure_reads_error() {
        let binding = bound();
        binding
            .problem_state()
            .set_problem(MockLibrary::open_problem(MockProblem::sample()));
        binding.analysis_state().rebind().unwrap();

        let cell = binding.problem_cell(|_| Err(WorkshopError::Library("boom".into())));
        assert_eq!(cell, CellValue::Error);
        let cell = binding.analysis_cell(|_, a| Ok(outcome_cell(a.empirical_shape(FunctionKind::Constraint, 0)?)));
        assert_eq!(
            cell,
            CellValue::Unavailable(UnavailableReason::from(ResultStatus::NotAvailable))
        );
    }

    #[test]
    fn test_in_progress_while_analysing() {
        let binding = bound();
        binding
            .problem_state()
            .set_problem(MockLibrary::open_problem(MockProblem::sample()));
        binding.analysis_state().rebind().unwrap();

        let guard = binding.analysis_state().begin_analysis();
        assert_eq!(
            binding.analysis_cell(|_, _| Ok(CellValue::Real(1.0))),
            CellValue::Unavailable(UnavailableReason::InProgress)
        );
        drop(guard);
        assert_eq!(binding.analysis_cell(|_, _| Ok(CellValue::Real(1.0))), CellValue::Real(1.0));
    }

    #[test]
    fn test_refresh_coalesces_events() {
        let binding = bound();
        let events = binding.subscribe();
        assert!(!binding.refresh());

        binding
            .problem_state()
            .set_problem(MockLibrary::open_problem(MockProblem::sample()));
        binding.analysis_state().rebind().unwrap();
        assert!(binding.refresh());
        assert_eq!(events.drain(), vec![TableEvent::DataChanged]);
        assert!(!binding.refresh());
    }
}
