//! Background analysis tasks
//!
//! Sampling a function can take seconds inside the analysis library, so every
//! analysis runs as a task on its own thread. The launching thread gets a
//! [`TaskHandle`] and polls it for [`TaskEvent`]s over a crossbeam channel; it
//! never blocks on the library.
//!
//! # Ordering
//!
//! [`spawn`] takes the [`AnalysingGuard`](crate::state::AnalysingGuard) on the
//! calling thread before the task thread exists. The task drops the guard
//! after its last step and only then sends [`TaskEvent::Finished`], so a
//! caller that has seen `Finished` also sees `analysing == false`.
//!
//! # Cancellation
//!
//! A [`CancellationToken`] is checked before each entity of a batch. Entities
//! analysed before the cancel keep their results.

use crate::error::{Result, WorkshopError};
use crate::state::AnalysisState;
use crate::types::FunctionKind;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Shared flag asking a running task to stop
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Functions to sample in one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTask {
    pub kind: FunctionKind,
    pub indices: Vec<usize>,
    /// Fill the extra histograms from each sampled function
    pub extra_histograms: bool,
    scope: TaskScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskScope {
    One,
    Selected,
    All,
}

impl AnalysisTask {
    /// Analyse a single function
    pub fn one(kind: FunctionKind, index: usize) -> Self {
        Self::with_scope(kind, vec![index], TaskScope::One)
    }

    /// Analyse the given functions in order
    pub fn selected(kind: FunctionKind, indices: impl IntoIterator<Item = usize>) -> Self {
        Self::with_scope(kind, indices.into_iter().collect(), TaskScope::Selected)
    }

    /// Analyse every function of a kind
    pub fn all(kind: FunctionKind, count: usize) -> Self {
        Self::with_scope(kind, (0..count).collect(), TaskScope::All)
    }

    fn with_scope(kind: FunctionKind, indices: Vec<usize>, scope: TaskScope) -> Self {
        Self {
            kind,
            indices,
            extra_histograms: false,
            scope,
        }
    }

    pub fn extra_histograms(mut self, enabled: bool) -> Self {
        self.extra_histograms = enabled;
        self
    }

    /// Title for progress reporting, `name_of` resolves a function index
    pub fn title(&self, name_of: impl Fn(usize) -> String) -> String {
        match (self.scope, self.indices.first()) {
            (TaskScope::One, Some(&index)) => {
                format!("Analysing {} {}", self.kind.noun(), name_of(index))
            }
            (TaskScope::All, _) => format!("Analysing all {}s", self.kind.noun()),
            _ => format!("Analysing {}s", self.kind.noun()),
        }
    }
}

/// Summary of a finished task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutcome {
    pub total: usize,
    /// Functions sampled successfully, in order
    pub completed: Vec<usize>,
    /// Functions whose sampling failed
    pub failed: Vec<usize>,
    pub cancelled: bool,
}

/// Progress reported by a running task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Progress { percent: u8, action: String },
    Finished(TaskOutcome),
}

fn progress(step: usize, total: usize) -> u8 {
    u8::try_from((step + 1) * 100 / (total + 1)).unwrap_or(100)
}

/// Sample each function of `task` in order on the current thread
///
/// Failures are logged and recorded without stopping the batch. Every
/// successful step tells the analysis subscribers that results changed.
pub fn run_batch(
    state: &AnalysisState,
    task: &AnalysisTask,
    token: &CancellationToken,
    events: &Sender<TaskEvent>,
) -> TaskOutcome {
    let problem = state.problem_state().problem();
    let name_of = |index: usize| -> String {
        let name = problem.as_ref().and_then(|p| match task.kind {
            FunctionKind::Constraint => p.constraint_name(index).ok(),
            FunctionKind::Objective => p.objective_name(index).ok(),
        });
        name.unwrap_or_else(|| format!("#{}", index))
    };

    let total = task.indices.len();
    let mut outcome = TaskOutcome {
        total,
        ..Default::default()
    };

    for (step, &index) in task.indices.iter().enumerate() {
        if token.is_cancelled() {
            tracing::info!("Analysis cancelled after {} of {} {}s", step, total, task.kind.noun());
            outcome.cancelled = true;
            break;
        }

        let action = format!("Analysing {} {}", task.kind.noun(), name_of(index));
        tracing::debug!("{}", action);
        let _ = events.send(TaskEvent::Progress {
            percent: progress(step, total),
            action,
        });

        match state.with_handle(|a| a.sample(task.kind, index, task.extra_histograms)) {
            Ok(()) => {
                outcome.completed.push(index);
                state.notify_data_changed();
            }
            Err(e) => {
                tracing::warn!("Failed to analyse {} {}: {}", task.kind.noun(), index, e);
                outcome.failed.push(index);
            }
        }
    }

    if !outcome.cancelled {
        let _ = events.send(TaskEvent::Progress {
            percent: 100,
            action: task.title(name_of),
        });
    }
    outcome
}

/// Start `task` on a new thread
///
/// Fails without spawning when no analysis handle is loaded.
pub fn spawn(state: Arc<AnalysisState>, task: AnalysisTask) -> Result<TaskHandle> {
    if !state.is_loaded() {
        return Err(WorkshopError::NotLoaded("analysis"));
    }

    let guard = state.begin_analysis();
    let token = CancellationToken::new();
    let (tx, rx) = unbounded();

    let task_token = token.clone();
    let join = std::thread::Builder::new()
        .name("analysis-task".to_string())
        .spawn(move || {
            let outcome = run_batch(guard.state(), &task, &task_token, &tx);
            drop(guard);
            let _ = tx.send(TaskEvent::Finished(outcome));
        })?;

    Ok(TaskHandle {
        events: rx,
        token,
        join: Some(join),
        outcome: None,
    })
}

/// Launcher-side view of a running task
pub struct TaskHandle {
    events: Receiver<TaskEvent>,
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
    outcome: Option<TaskOutcome>,
}

impl TaskHandle {
    /// Collect pending events without blocking
    pub fn poll(&mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let TaskEvent::Finished(outcome) = &event {
                self.outcome = Some(outcome.clone());
            }
            events.push(event);
        }
        events
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// True once `Finished` has been polled
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&TaskOutcome> {
        self.outcome.as_ref()
    }

    /// Block until the task ends and return its outcome
    pub fn wait(mut self) -> Result<TaskOutcome> {
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::error!("Analysis task panicked");
            }
        }
        self.poll();
        self.outcome.take().ok_or(WorkshopError::Cancelled)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if self.join.is_some() && self.outcome.is_none() {
            tracing::debug!("Task handle dropped before the task finished; task keeps running");
        }
    }
}

#[cfg(all(test, feature = "mock-library"))]
mod tests {
    use super::*;
    use crate::backend::{MockFailure, MockLibrary, MockProblem};
    use crate::state::{ProblemState, StateEvent};
    use crate::types::{Outcome, ResultStatus};

    fn loaded(problem: MockProblem) -> Arc<AnalysisState> {
        let state = ProblemState::new();
        state.set_problem(MockLibrary::open_problem(problem));
        let analysis = AnalysisState::new(state);
        analysis.rebind().unwrap();
        analysis
    }

    fn computed(analysis: &AnalysisState, index: usize) -> bool {
        analysis
            .with_handle(|a| a.empirical_shape(FunctionKind::Constraint, index))
            .map(|o| o.status() == ResultStatus::Computed)
            .unwrap()
    }

    #[test]
    fn test_progress_formula() {
        assert_eq!(progress(0, 1), 50);
        assert_eq!(progress(0, 4), 20);
        assert_eq!(progress(3, 4), 80);
    }

    #[test]
    fn test_titles() {
        let name = |i: usize| format!("c{}", i);
        assert_eq!(
            AnalysisTask::one(FunctionKind::Constraint, 2).title(name),
            "Analysing constraint c2"
        );
        assert_eq!(
            AnalysisTask::selected(FunctionKind::Objective, [0, 1]).title(name),
            "Analysing objectives"
        );
        assert_eq!(
            AnalysisTask::all(FunctionKind::Constraint, 5).title(name),
            "Analysing all constraints"
        );
    }

    #[test]
    fn test_run_batch_reports_progress() {
        let analysis = loaded(MockProblem::sample());
        let (tx, rx) = unbounded();
        let task = AnalysisTask::selected(FunctionKind::Constraint, [0, 2]);
        let outcome = run_batch(&analysis, &task, &CancellationToken::new(), &tx);

        assert_eq!(outcome.completed, vec![0, 2]);
        assert!(!outcome.cancelled);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                TaskEvent::Progress {
                    percent: 33,
                    action: "Analysing constraint budget".into()
                },
                TaskEvent::Progress {
                    percent: 66,
                    action: "Analysing constraint disc".into()
                },
                TaskEvent::Progress {
                    percent: 100,
                    action: "Analysing constraints".into()
                },
            ]
        );
        assert!(computed(&analysis, 0));
        assert!(!computed(&analysis, 1));
    }

    #[test]
    fn test_failures_do_not_stop_batch() {
        let analysis = loaded(
            MockProblem::sample().with_failure(MockFailure::Sampling(FunctionKind::Constraint, 1)),
        );
        let (tx, _rx) = unbounded();
        let task = AnalysisTask::all(FunctionKind::Constraint, 5);
        let outcome = run_batch(&analysis, &task, &CancellationToken::new(), &tx);
        assert_eq!(outcome.completed, vec![0, 2, 3, 4]);
        assert_eq!(outcome.failed, vec![1]);
    }

    #[test]
    fn test_cancel_before_start_runs_nothing() {
        let analysis = loaded(MockProblem::sample());
        let (tx, _rx) = unbounded();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = run_batch(&analysis, &AnalysisTask::all(FunctionKind::Constraint, 5), &token, &tx);
        assert!(outcome.cancelled);
        assert!(outcome.completed.is_empty());
        assert!(!computed(&analysis, 0));
    }

    #[test]
    fn test_spawn_clears_analysing_before_finished() {
        let analysis = loaded(MockProblem::sample());
        let events = analysis.subscribe();
        let handle = spawn(analysis.clone(), AnalysisTask::one(FunctionKind::Objective, 0)).unwrap();
        assert!(analysis.is_analysing());

        let outcome = handle.wait().unwrap();
        assert_eq!(outcome.completed, vec![0]);
        assert!(!analysis.is_analysing());
        let extremum = analysis.with_handle(|a| a.extremum(0)).unwrap();
        assert_eq!(extremum, Outcome::Computed(-12.5));

        let seen = events.drain();
        assert_eq!(seen.first(), Some(&StateEvent::AnalysingChanged(true)));
        assert_eq!(seen.last(), Some(&StateEvent::AnalysingChanged(false)));
    }

    #[test]
    fn test_spawn_requires_analysis() {
        let analysis = AnalysisState::new(ProblemState::new());
        let err = spawn(analysis.clone(), AnalysisTask::one(FunctionKind::Constraint, 0));
        assert!(matches!(err, Err(WorkshopError::NotLoaded("analysis"))));
        assert!(!analysis.is_analysing());
    }
}
