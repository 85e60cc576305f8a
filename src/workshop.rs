//! Workshop views
//!
//! A [`Workshop`] is one open table view: an entity table, the filter engine
//! deciding which of its rows are visible, and the launcher for background
//! analyses of its functions. Workshops are owned by the
//! [`Session`](crate::session::Session), which routes cross-navigation
//! requests to them.

use crate::error::{Result, WorkshopError};
use crate::filter::{preset, presets, FilterEngine, NamedFilter, RowPredicate};
use crate::state::AnalysisState;
use crate::table::{
    CellValue, ConstraintTable, EntityKind, ObjectiveTable, TableModel, VariableTable,
};
use crate::trace;
use crate::worker::{self, AnalysisTask, TaskEvent, TaskHandle, TaskOutcome};
use std::path::Path;
use std::sync::Arc;

/// The table behind a workshop
pub enum WorkshopTable {
    Variables(VariableTable),
    Constraints(ConstraintTable),
    Objectives(ObjectiveTable),
}

impl WorkshopTable {
    fn new(kind: EntityKind, analysis: Arc<AnalysisState>) -> Self {
        match kind {
            EntityKind::Variable => WorkshopTable::Variables(VariableTable::new(analysis)),
            EntityKind::Constraint => WorkshopTable::Constraints(ConstraintTable::new(analysis)),
            EntityKind::Objective => WorkshopTable::Objectives(ObjectiveTable::new(analysis)),
        }
    }

    pub fn model(&self) -> &dyn TableModel {
        match self {
            WorkshopTable::Variables(t) => t,
            WorkshopTable::Constraints(t) => t,
            WorkshopTable::Objectives(t) => t,
        }
    }
}

/// One open table view
pub struct Workshop {
    table: WorkshopTable,
    filter: FilterEngine,
    task: Option<TaskHandle>,
    extra_histograms: bool,
    progress: Option<(u8, String)>,
}

impl Workshop {
    pub fn new(kind: EntityKind, analysis: Arc<AnalysisState>) -> Self {
        Self {
            table: WorkshopTable::new(kind, analysis),
            filter: FilterEngine::new(),
            task: None,
            extra_histograms: false,
            progress: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.model().kind()
    }

    pub fn model(&self) -> &dyn TableModel {
        self.table.model()
    }

    pub fn table(&self) -> &WorkshopTable {
        &self.table
    }

    pub fn variable_table(&self) -> Option<&VariableTable> {
        match &self.table {
            WorkshopTable::Variables(t) => Some(t),
            _ => None,
        }
    }

    pub fn constraint_table(&self) -> Option<&ConstraintTable> {
        match &self.table {
            WorkshopTable::Constraints(t) => Some(t),
            _ => None,
        }
    }

    fn analysis(&self) -> &Arc<AnalysisState> {
        self.model().binding().analysis_state()
    }

    // Filtering

    pub fn presets(&self) -> Vec<NamedFilter> {
        presets(self.kind())
    }

    /// Install a named filter by its display name
    pub fn select_preset(&mut self, name: &str) -> Result<()> {
        let predicate = preset(self.kind(), name).ok_or_else(|| {
            WorkshopError::Validation(format!("Unknown {} filter '{}'", self.kind().noun(), name))
        })?;
        self.filter.select(predicate);
        Ok(())
    }

    pub fn select_filter(&mut self, predicate: RowPredicate) {
        self.filter.select(predicate);
    }

    /// Show only the entities with the given ids, replacing the current filter
    pub fn show_only(&mut self, ids: impl IntoIterator<Item = usize>) {
        let column = self.model().identifier_column();
        self.filter
            .install_related(RowPredicate::membership(column, ids));
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.filter.set_reverse(reverse);
    }

    pub fn toggle_reverse(&mut self) {
        self.filter.toggle_reverse();
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn visible_rows(&self) -> Vec<usize> {
        self.filter.visible_rows(self.model())
    }

    pub fn visible_count(&self) -> usize {
        self.filter.visible_count(self.model())
    }

    /// Label text such as `3 of 5 constraints visible`
    pub fn count_label(&self) -> String {
        format!(
            "{} of {} {}s visible",
            self.visible_count(),
            self.model().row_count(),
            self.kind().noun()
        )
    }

    // Editing

    pub fn value(&self, row: usize, column: usize) -> CellValue {
        self.model().value(row, column)
    }

    pub fn set_value(&self, row: usize, column: usize, value: CellValue) -> Result<()> {
        self.model().set_value(row, column, value)
    }

    /// Restore every temporary bound to the original bounds
    pub fn reset_bounds(&self) -> Result<()> {
        if self.analysis().is_analysing() {
            return Err(WorkshopError::Validation(
                "Temporary bounds cannot change while an analysis is running".to_string(),
            ));
        }
        self.analysis().reset_bounds()
    }

    // Analysis

    pub fn extra_histograms(&self) -> bool {
        self.extra_histograms
    }

    /// Fill the extra histograms when analysing a single function
    pub fn set_extra_histograms(&mut self, enabled: bool) {
        self.extra_histograms = enabled;
    }

    pub fn analyze(&mut self, row: usize) -> Result<()> {
        let kind = self.function_kind()?;
        let task = AnalysisTask::one(kind, row).extra_histograms(self.extra_histograms);
        self.launch(task)
    }

    pub fn analyze_selected(&mut self, rows: &[usize]) -> Result<()> {
        let kind = self.function_kind()?;
        self.launch(AnalysisTask::selected(kind, rows.iter().copied()))
    }

    pub fn analyze_all(&mut self) -> Result<()> {
        let kind = self.function_kind()?;
        let count = self.model().row_count();
        self.launch(AnalysisTask::all(kind, count))
    }

    fn function_kind(&self) -> Result<crate::types::FunctionKind> {
        self.kind().function_kind().ok_or_else(|| {
            WorkshopError::Validation("Variables are not analysed on their own".to_string())
        })
    }

    fn launch(&mut self, task: AnalysisTask) -> Result<()> {
        if self.task.is_some() || self.analysis().is_analysing() {
            return Err(WorkshopError::Validation(
                "An analysis is already running".to_string(),
            ));
        }
        tracing::info!(
            "Starting analysis of {} {}(s)",
            task.indices.len(),
            task.kind.noun()
        );
        self.progress = None;
        self.task = Some(worker::spawn(Arc::clone(self.analysis()), task)?);
        Ok(())
    }

    /// Drain task events and refresh the table
    ///
    /// Returns the events seen since the last poll; the task handle is kept
    /// until its `Finished` event has been returned.
    pub fn poll(&mut self) -> Vec<TaskEvent> {
        let events = match self.task.as_mut() {
            Some(task) => task.poll(),
            None => Vec::new(),
        };
        for event in &events {
            match event {
                TaskEvent::Progress { percent, action } => {
                    self.progress = Some((*percent, action.clone()));
                }
                TaskEvent::Finished(outcome) => {
                    self.progress = None;
                    self.task = None;
                    tracing::info!(
                        "Analysis finished: {} of {} done, {} failed{}",
                        outcome.completed.len(),
                        outcome.total,
                        outcome.failed.len(),
                        if outcome.cancelled { ", cancelled" } else { "" }
                    );
                }
            }
        }
        self.refresh();
        events
    }

    /// Latest progress of the running task
    pub fn progress(&self) -> Option<&(u8, String)> {
        self.progress.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn cancel_analysis(&self) {
        if let Some(task) = &self.task {
            tracing::info!("Cancelling analysis");
            task.cancel();
        }
    }

    /// Block until the running task ends
    pub fn wait(&mut self) -> Result<Option<TaskOutcome>> {
        let Some(task) = self.task.take() else {
            return Ok(None);
        };
        let outcome = task.wait()?;
        self.progress = None;
        self.refresh();
        Ok(Some(outcome))
    }

    pub fn refresh(&self) -> bool {
        self.model().refresh()
    }

    // Trace

    /// Append the visible rows to the trace file at `path`
    pub fn trace_to(&self, path: &Path) -> Result<()> {
        trace::append_trace(path, self.model(), &self.visible_rows())
    }
}
