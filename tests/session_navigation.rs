//! Integration tests for session cross-navigation
//!
//! These tests exercise the session as a whole on the sample problem:
//! - "Show related" requests across workshop kinds
//! - Temporary bound edits
//! - Trace export to the configured location

#![cfg(feature = "mock-library")]

mod common;

use common::mock_helpers::loaded_session;
use mprobe_workshop::backend::{MockLibrary, MockProblem};
use mprobe_workshop::config::AppConfig;
use mprobe_workshop::table::{VariableColumn, BOUNDS_ERROR};
use mprobe_workshop::{CellValue, EntityKind, Session, WorkshopError};
use std::path::PathBuf;

#[test]
fn test_show_related_across_kinds() {
    let mut session = loaded_session(MockProblem::sample());
    let variables = session.open_workshop(EntityKind::Variable);
    let constraints = session.open_workshop(EntityKind::Constraint);
    let objectives = session.open_workshop(EntityKind::Objective);

    assert_eq!(session.show_constraints_with_variable(3).unwrap(), 1);
    assert_eq!(session.workshop(constraints).unwrap().visible_rows(), vec![1, 4]);

    session.show_objectives_with_variable(0).unwrap();
    assert_eq!(session.workshop(objectives).unwrap().visible_rows(), vec![0]);

    session.show_variables_of_constraint(4).unwrap();
    assert_eq!(session.workshop(variables).unwrap().visible_rows(), vec![1, 2, 3]);
    assert_eq!(
        session.workshop(variables).unwrap().count_label(),
        "3 of 4 variables visible"
    );
}

#[test]
fn test_related_filter_resets_reverse() {
    let mut session = loaded_session(MockProblem::sample());
    let constraints = session.open_workshop(EntityKind::Constraint);
    session.workshop_mut(constraints).unwrap().set_reverse(true);

    session.show_constraints_with_variable(0).unwrap();
    let workshop = session.workshop(constraints).unwrap();
    assert!(!workshop.filter().is_reversed());
    assert_eq!(workshop.visible_rows(), vec![0, 1, 2, 3]);
}

#[test]
fn test_related_without_open_views_updates_nothing() {
    let mut session = loaded_session(MockProblem::sample());
    assert_eq!(session.show_variables_of_objective(0).unwrap(), 0);
}

#[test]
fn test_out_of_range_entity_is_an_error() {
    let mut session = loaded_session(MockProblem::sample());
    session.open_workshop(EntityKind::Constraint);
    assert!(session.show_constraints_with_variable(99).is_err());
}

#[test]
fn test_reversed_bounds_rejected_and_kept() {
    let mut session = loaded_session(MockProblem::sample());
    let id = session.open_workshop(EntityKind::Variable);
    let workshop = session.workshop(id).unwrap();
    let lower = VariableColumn::TmpLower.index();
    let upper = VariableColumn::TmpUpper.index();

    workshop.set_value(1, lower, CellValue::Real(1.0)).unwrap();
    let err = workshop.set_value(1, lower, CellValue::Real(6.0)).unwrap_err();
    assert!(matches!(err, WorkshopError::Validation(ref msg) if msg == BOUNDS_ERROR));
    assert_eq!(workshop.value(1, lower), CellValue::Real(1.0));
    assert_eq!(workshop.value(1, upper), CellValue::Real(5.0));

    workshop.reset_bounds().unwrap();
    assert_eq!(workshop.value(1, lower), CellValue::Real(0.0));
}

#[test]
fn test_trace_goes_to_instance_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        trace_file: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    };
    let library = MockLibrary::new().with_instance("sample.nl", MockProblem::sample());
    let mut session = Session::new(config);
    session.load(&library, &[PathBuf::from("sample.nl")]).unwrap();

    let id = session.open_workshop(EntityKind::Constraint);
    session.workshop_mut(id).unwrap().select_preset("Linear").unwrap();
    let path = session.trace(id).unwrap();

    assert_eq!(path, dir.path().join("sample_nl.txt"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Constraint workshop trace: "));
    // title, header, two rows and the closing blank line
    assert_eq!(text.lines().count(), 5);
    assert!(text.contains("\nbudget\t0\t"));
}

#[test]
fn test_statistics_of_sample() {
    let session = loaded_session(MockProblem::sample());
    let stats = session.statistics().unwrap();
    assert_eq!(stats.variables.total, 4);
    assert_eq!(stats.constraints, 5);
    assert_eq!(stats.objectives, 2);
    assert_eq!(stats.title(), "Statistics: sample.nl");
}
