//! Workshop session and cross-navigation
//!
//! A [`Session`] owns the two state holders, the application config and every
//! open [`Workshop`]. It loads problem instances and routes "show related"
//! requests: the related ids are computed once from the problem and installed
//! as a membership filter on every open workshop of the target kind,
//! replacing whatever filter was there.
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::new(AppConfig::load_or_default());
//! session.load(&library, &["model.nl".into()])?;
//! let constraints = session.open_workshop(EntityKind::Constraint);
//! session.show_constraints_with_variable(0)?;
//! ```

use crate::backend::ProblemLoader;
use crate::config::{AnalysisSettings, AppConfig};
use crate::error::{Result, WorkshopError};
use crate::histogram::{BinLayout, HistType, HistogramStats};
use crate::state::{AnalysisState, ProblemState};
use crate::statistics::ProblemStatistics;
use crate::table::EntityKind;
use crate::worker::TaskEvent;
use crate::workshop::Workshop;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifies an open workshop within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkshopId(usize);

/// Problem, analysis and open workshops of one user session
pub struct Session {
    config: AppConfig,
    problem: Arc<ProblemState>,
    analysis: Arc<AnalysisState>,
    workshops: Vec<Option<Workshop>>,
    unload_pending: bool,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let problem = ProblemState::new();
        let analysis = AnalysisState::with_settings(
            Arc::clone(&problem),
            config.analysis.clone(),
            config.histogram_bins.clone(),
        );
        Self {
            config,
            problem,
            analysis,
            workshops: Vec::new(),
            unload_pending: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn problem_state(&self) -> &Arc<ProblemState> {
        &self.problem
    }

    pub fn analysis_state(&self) -> &Arc<AnalysisState> {
        &self.analysis
    }

    // Loading

    /// Load a problem instance, replacing the current one
    ///
    /// On failure every view stays unloaded and the error is returned once.
    pub fn load(&mut self, loader: &dyn ProblemLoader, files: &[PathBuf]) -> Result<()> {
        if self.analysis.is_analysing() {
            return Err(WorkshopError::Validation(
                "Cannot load a problem while an analysis is running".to_string(),
            ));
        }
        self.unload_pending = false;
        self.analysis.release();
        if let Err(e) = self.problem.load(loader, files) {
            tracing::error!("{}", e);
            self.refresh();
            return Err(e);
        }
        self.analysis.rebind()?;

        if let Some(parent) = files.first().and_then(|f| f.parent()) {
            self.config.last_path = Some(parent.to_path_buf());
        }
        self.refresh();
        Ok(())
    }

    /// Unload the problem, cancelling running analyses first
    ///
    /// Never waits for a running task. If one is still winding down, the
    /// unload completes in the first [`Session::poll`] after it finished.
    pub fn unload(&mut self) {
        for workshop in self.workshops.iter().flatten() {
            workshop.cancel_analysis();
        }
        if self.analysis.is_analysing() {
            tracing::info!("Unload deferred until the running analysis stops");
            self.unload_pending = true;
            return;
        }
        self.finish_unload();
    }

    fn finish_unload(&mut self) {
        self.unload_pending = false;
        self.analysis.release();
        self.problem.unload();
        self.refresh();
    }

    /// True while an [`unload`](Session::unload) waits for a task to stop
    pub fn is_unload_pending(&self) -> bool {
        self.unload_pending
    }

    pub fn is_loaded(&self) -> bool {
        self.problem.is_loaded()
    }

    // Workshops

    pub fn open_workshop(&mut self, kind: EntityKind) -> WorkshopId {
        let workshop = Workshop::new(kind, Arc::clone(&self.analysis));
        let id = match self.workshops.iter().position(Option::is_none) {
            Some(free) => {
                self.workshops[free] = Some(workshop);
                free
            }
            None => {
                self.workshops.push(Some(workshop));
                self.workshops.len() - 1
            }
        };
        tracing::debug!("Opened {} workshop {}", kind.noun(), id);
        WorkshopId(id)
    }

    /// Close a workshop, cancelling its running analysis
    pub fn close_workshop(&mut self, id: WorkshopId) {
        if let Some(workshop) = self.workshops.get_mut(id.0).and_then(Option::take) {
            workshop.cancel_analysis();
        }
    }

    pub fn workshop(&self, id: WorkshopId) -> Option<&Workshop> {
        self.workshops.get(id.0).and_then(Option::as_ref)
    }

    pub fn workshop_mut(&mut self, id: WorkshopId) -> Option<&mut Workshop> {
        self.workshops.get_mut(id.0).and_then(Option::as_mut)
    }

    fn workshops_of(&mut self, kind: EntityKind) -> impl Iterator<Item = &mut Workshop> + '_ {
        self.workshops
            .iter_mut()
            .flatten()
            .filter(move |w| w.kind() == kind)
    }

    /// Install `ids` on every open workshop of `kind`, returning how many
    fn show_related(&mut self, kind: EntityKind, ids: Vec<usize>) -> usize {
        tracing::debug!("Showing {} related {}s", ids.len(), kind.noun());
        let mut updated = 0;
        for workshop in self.workshops_of(kind) {
            workshop.show_only(ids.iter().copied());
            updated += 1;
        }
        updated
    }

    // Cross-navigation

    pub fn show_constraints_with_variable(&mut self, variable: usize) -> Result<usize> {
        let ids = self.problem.require()?.variable_presence(variable)?.constraints;
        Ok(self.show_related(EntityKind::Constraint, ids))
    }

    pub fn show_objectives_with_variable(&mut self, variable: usize) -> Result<usize> {
        let ids = self.problem.require()?.variable_presence(variable)?.objectives;
        Ok(self.show_related(EntityKind::Objective, ids))
    }

    pub fn show_variables_of_constraint(&mut self, constraint: usize) -> Result<usize> {
        let ids = self.problem.require()?.constraint_variables(constraint)?;
        Ok(self.show_related(EntityKind::Variable, ids))
    }

    pub fn show_variables_of_objective(&mut self, objective: usize) -> Result<usize> {
        let ids = self.problem.require()?.objective_variables(objective)?;
        Ok(self.show_related(EntityKind::Variable, ids))
    }

    /// Propagate an objective selection to the variable workshops
    pub fn select_objective(&mut self, objective: usize) {
        for workshop in self.workshops_of(EntityKind::Variable) {
            if let Some(table) = workshop.variable_table() {
                table.set_objective_for_best_point(objective);
            }
        }
    }

    // Analysis

    /// Poll every workshop's task and refresh all views
    pub fn poll(&mut self) -> Vec<(WorkshopId, TaskEvent)> {
        let mut events = Vec::new();
        for (id, slot) in self.workshops.iter_mut().enumerate() {
            if let Some(workshop) = slot {
                events.extend(workshop.poll().into_iter().map(|e| (WorkshopId(id), e)));
            }
        }
        if self.unload_pending && !self.analysis.is_analysing() {
            self.finish_unload();
        }
        events
    }

    pub fn refresh(&self) {
        for workshop in self.workshops.iter().flatten() {
            workshop.refresh();
        }
    }

    /// Validate and apply analysis settings, remembering them in the config
    pub fn apply_settings(&mut self, settings: AnalysisSettings) -> Result<()> {
        self.analysis.apply_settings(settings.clone())?;
        self.config.analysis = settings;
        Ok(())
    }

    pub fn set_histogram_bins(&mut self, hist: HistType, layout: BinLayout) -> Result<()> {
        self.analysis.set_histogram_bins(hist, layout.clone())?;
        self.config.histogram_bins.set(hist, layout)
    }

    /// Extra histogram snapshot, [`WorkshopError::Busy`] while analysing
    pub fn histogram(&self, hist: HistType) -> Result<HistogramStats> {
        self.analysis.histogram(hist)
    }

    pub fn statistics(&self) -> Result<ProblemStatistics> {
        ProblemStatistics::collect(self.problem.require()?.as_ref())
    }

    // Trace

    /// Trace file for the current instance
    pub fn trace_path(&self) -> PathBuf {
        self.config.trace_path(&self.problem.instance_name())
    }

    /// Append the visible rows of a workshop to the trace file
    pub fn trace(&self, id: WorkshopId) -> Result<PathBuf> {
        let workshop = self
            .workshop(id)
            .ok_or(WorkshopError::NotLoaded("workshop"))?;
        let path = self.trace_path();
        workshop.trace_to(&path)?;
        Ok(path)
    }

    /// Persist the config, logging instead of failing
    pub fn save_config(&self) {
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for workshop in self.workshops.iter().flatten() {
            workshop.cancel_analysis();
        }
    }
}

#[cfg(all(test, feature = "mock-library"))]
mod tests {
    use super::*;
    use crate::backend::{MockLibrary, MockProblem};
    use crate::table::{CellValue, VariableColumn};

    fn loaded() -> Session {
        let library = MockLibrary::new().with_instance("/models/sample.nl", MockProblem::sample());
        let mut session = Session::new(AppConfig::default());
        session
            .load(&library, &[PathBuf::from("/models/sample.nl")])
            .unwrap();
        session
    }

    #[test]
    fn test_load_sets_last_path() {
        let session = loaded();
        assert!(session.is_loaded());
        assert!(session.analysis_state().is_loaded());
        assert_eq!(session.config().last_path, Some(PathBuf::from("/models")));
    }

    #[test]
    fn test_failed_load_leaves_views_empty() {
        let mut session = loaded();
        let id = session.open_workshop(EntityKind::Constraint);
        let err = session
            .load(&MockLibrary::new(), &[PathBuf::from("other.nl")])
            .unwrap_err();
        assert!(matches!(err, WorkshopError::Load(_)));
        assert!(!session.analysis_state().is_loaded());
        assert_eq!(session.workshop(id).unwrap().model().row_count(), 0);
    }

    #[test]
    fn test_related_filters_replace() {
        let mut session = loaded();
        let constraints = session.open_workshop(EntityKind::Constraint);
        let second = session.open_workshop(EntityKind::Constraint);
        let variables = session.open_workshop(EntityKind::Variable);

        session
            .workshop_mut(constraints)
            .unwrap()
            .select_preset("Linear")
            .unwrap();
        // flag appears in balance and shell
        assert_eq!(session.show_constraints_with_variable(3).unwrap(), 2);
        assert_eq!(session.workshop(constraints).unwrap().visible_rows(), vec![1, 4]);
        assert_eq!(session.workshop(second).unwrap().visible_rows(), vec![1, 4]);

        session.show_variables_of_objective(1).unwrap();
        assert_eq!(session.workshop(variables).unwrap().visible_rows(), vec![1, 3]);
        session.show_variables_of_constraint(0).unwrap();
        assert_eq!(session.workshop(variables).unwrap().visible_rows(), vec![0, 1, 2]);
    }

    #[test]
    fn test_navigation_needs_problem() {
        let mut session = Session::new(AppConfig::default());
        assert!(matches!(
            session.show_objectives_with_variable(0),
            Err(WorkshopError::NotLoaded("problem"))
        ));
    }

    #[test]
    fn test_select_objective_updates_variable_views() {
        let mut session = loaded();
        let variables = session.open_workshop(EntityKind::Variable);
        session.select_objective(1);
        let table = session.workshop(variables).unwrap().variable_table().unwrap();
        assert_eq!(table.best_point_objective(), 1);
        assert!(matches!(
            session.workshop(variables).unwrap().value(0, VariableColumn::BestPoint.index()),
            CellValue::Real(v) if v.is_nan()
        ));
    }

    #[test]
    fn test_closed_slots_are_reused() {
        let mut session = loaded();
        let first = session.open_workshop(EntityKind::Objective);
        session.close_workshop(first);
        assert!(session.workshop(first).is_none());
        let again = session.open_workshop(EntityKind::Variable);
        assert_eq!(again, first);
    }
}
