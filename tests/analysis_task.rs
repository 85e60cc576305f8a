//! Integration tests for background analysis tasks
//!
//! These tests validate the task runner against the mock library:
//! - Cancellation leaves exactly the sampled functions updated
//! - The `analysing` projection brackets every task
//! - Unloading and histogram reads never wait for a running task
//! - Failed functions do not stop a batch

#![cfg(feature = "mock-library")]

mod common;

use common::builders::ProblemBuilder;
use common::mock_helpers::{cancel_at, loaded_analysis, loaded_session, TokenSlot};
use crossbeam_channel::unbounded;
use mprobe_workshop::backend::MockFailure;
use mprobe_workshop::histogram::HistType;
use mprobe_workshop::state::StateEvent;
use mprobe_workshop::table::{ConstraintColumn, ConstraintTable, UnavailableReason};
use mprobe_workshop::types::FunctionKind;
use mprobe_workshop::worker::{self, AnalysisTask, CancellationToken, TaskEvent};
use mprobe_workshop::{CellValue, EntityKind, TableModel, WorkshopError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const TOTAL: usize = 6;

#[test]
fn test_cancel_after_k_leaves_k_updated() {
    for k in 0..=TOTAL {
        let slot: TokenSlot = Arc::new(Mutex::new(None));
        let mut problem = ProblemBuilder::new("cancel.nl")
            .nonlinear_constraints(TOTAL)
            .build();
        if k > 0 {
            problem = problem.with_sample_hook(cancel_at(
                FunctionKind::Constraint,
                k - 1,
                Arc::clone(&slot),
            ));
        }
        let analysis = loaded_analysis(problem);

        let token = CancellationToken::new();
        *slot.lock().unwrap() = Some(token.clone());
        if k == 0 {
            token.cancel();
        }
        let (tx, _rx) = unbounded();
        let task = AnalysisTask::all(FunctionKind::Constraint, TOTAL);
        let outcome = worker::run_batch(&analysis, &task, &token, &tx);

        // a cancel during the last function comes too late to skip anything
        assert_eq!(outcome.cancelled, k < TOTAL, "k = {}", k);
        assert_eq!(outcome.completed, (0..k).collect::<Vec<_>>(), "k = {}", k);

        let table = ConstraintTable::new(Arc::clone(&analysis));
        let column = ConstraintColumn::EmpiricalShape.index();
        let updated = (0..TOTAL)
            .filter(|&row| !table.value(row, column).is_sentinel())
            .count();
        assert_eq!(updated, k, "k = {}", k);
    }
}

#[test]
fn test_unload_and_histogram_do_not_wait_for_running_task() {
    let problem = ProblemBuilder::new("busy.nl")
        .nonlinear_constraints(3)
        .build()
        .with_sample_delay(Duration::from_millis(400));
    let mut session = loaded_session(problem);
    let id = session.open_workshop(EntityKind::Constraint);
    session.workshop_mut(id).unwrap().analyze_all().unwrap();
    assert!(session.analysis_state().is_analysing());

    let started = Instant::now();
    assert!(matches!(
        session.histogram(HistType::LineLength),
        Err(WorkshopError::Busy)
    ));
    session.unload();
    assert!(started.elapsed() < Duration::from_millis(200));
    assert!(session.is_unload_pending());
    assert!(session.is_loaded());

    let mut outcome = None;
    assert!(common::wait_until(|| {
        for (_, event) in session.poll() {
            if let TaskEvent::Finished(finished) = event {
                outcome = Some(finished);
            }
        }
        !session.is_loaded()
    }));

    let outcome = outcome.expect("task finished before the unload");
    assert!(outcome.cancelled);
    assert!(outcome.completed.len() < 3);
    assert!(!session.is_unload_pending());
    assert!(!session.analysis_state().is_loaded());
    assert!(session.workshop(id).unwrap().visible_rows().is_empty());
}

#[test]
fn test_unload_without_running_task_is_immediate() {
    let mut session = loaded_session(ProblemBuilder::new("idle.nl").linear_constraints(2).build());
    session.open_workshop(EntityKind::Constraint);
    session.unload();
    assert!(!session.is_unload_pending());
    assert!(!session.is_loaded());
}

#[test]
fn test_analysing_brackets_spawned_task() {
    let analysis = loaded_analysis(ProblemBuilder::new("events.nl").linear_constraints(3).build());
    let events = analysis.subscribe();

    let mut handle = worker::spawn(
        Arc::clone(&analysis),
        AnalysisTask::all(FunctionKind::Constraint, 3),
    )
    .unwrap();
    assert!(analysis.is_analysing());

    let mut finished = false;
    assert!(common::wait_until(|| {
        for event in handle.poll() {
            if let TaskEvent::Finished(_) = event {
                // the guard is dropped before the outcome is sent
                assert!(!analysis.is_analysing());
                finished = true;
            }
        }
        finished
    }));

    let seen = events.drain();
    let start = seen
        .iter()
        .position(|e| *e == StateEvent::AnalysingChanged(true))
        .expect("start published");
    let end = seen
        .iter()
        .position(|e| *e == StateEvent::AnalysingChanged(false))
        .expect("end published");
    assert!(start < end);
    let data_changes = seen
        .iter()
        .filter(|e| **e == StateEvent::AnalysisDataChanged)
        .count();
    assert_eq!(data_changes, 3);
}

#[test]
fn test_cells_report_in_progress_while_analysing() {
    let problem = ProblemBuilder::new("slow.nl")
        .linear_constraints(2)
        .build()
        .with_sample_delay(Duration::from_millis(50));
    let analysis = loaded_analysis(problem);
    let table = ConstraintTable::new(Arc::clone(&analysis));

    let handle = worker::spawn(
        Arc::clone(&analysis),
        AnalysisTask::all(FunctionKind::Constraint, 2),
    )
    .unwrap();
    assert_eq!(
        table.value(0, ConstraintColumn::EmpiricalShape.index()),
        CellValue::Unavailable(UnavailableReason::InProgress)
    );
    assert_eq!(table.value(0, ConstraintColumn::Name.index()).to_string(), "lin0");

    let outcome = handle.wait().unwrap();
    assert_eq!(outcome.completed, vec![0, 1]);
    assert_eq!(
        table
            .value(1, ConstraintColumn::EmpiricalShape.index())
            .to_string(),
        "Linear"
    );
}

#[test]
fn test_spawned_task_can_be_cancelled() {
    let problem = ProblemBuilder::new("stop.nl")
        .nonlinear_constraints(5)
        .build()
        .with_sample_delay(Duration::from_millis(30));
    let analysis = loaded_analysis(problem);

    let mut handle = worker::spawn(
        Arc::clone(&analysis),
        AnalysisTask::all(FunctionKind::Constraint, 5),
    )
    .unwrap();
    assert!(common::wait_until(|| handle
        .poll()
        .iter()
        .any(|e| matches!(e, TaskEvent::Progress { .. }))));
    handle.cancel();

    let outcome = handle.wait().unwrap();
    assert!(outcome.cancelled);
    assert!(outcome.completed.len() < 5);
    assert!(!analysis.is_analysing());
}

#[test]
fn test_failures_do_not_stop_batch() {
    let problem = ProblemBuilder::new("flaky.nl")
        .linear_constraints(3)
        .build()
        .with_failure(MockFailure::Sampling(FunctionKind::Constraint, 1));
    let analysis = loaded_analysis(problem);

    let handle = worker::spawn(
        Arc::clone(&analysis),
        AnalysisTask::all(FunctionKind::Constraint, 3),
    )
    .unwrap();
    let outcome = handle.wait().unwrap();

    assert_eq!(outcome.completed, vec![0, 2]);
    assert_eq!(outcome.failed, vec![1]);
    assert!(!outcome.cancelled);
}
