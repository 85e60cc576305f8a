//! Mock construction helpers

use mprobe_workshop::backend::{MockLibrary, MockProblem, SampleHook};
use mprobe_workshop::config::AppConfig;
use mprobe_workshop::state::{AnalysisState, ProblemState};
use mprobe_workshop::types::FunctionKind;
use mprobe_workshop::worker::CancellationToken;
use mprobe_workshop::Session;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A session with `problem` loaded from `<name>`
pub fn loaded_session(problem: MockProblem) -> Session {
    let path = PathBuf::from(problem.name.clone());
    let library = MockLibrary::new().with_instance(path.clone(), problem);
    let mut session = Session::new(AppConfig::default());
    session
        .load(&library, &[path])
        .expect("mock instance loads");
    session
}

/// Problem and analysis holders with `problem` loaded
pub fn loaded_analysis(problem: MockProblem) -> Arc<AnalysisState> {
    let state = ProblemState::new();
    state.set_problem(MockLibrary::open_problem(problem));
    let analysis = AnalysisState::new(state);
    analysis.rebind().expect("analysis handle");
    analysis
}

/// Slot a test fills with the token of a task started after the hook
pub type TokenSlot = Arc<Mutex<Option<CancellationToken>>>;

/// Hook that cancels the token in `slot` when `index` starts sampling
pub fn cancel_at(kind: FunctionKind, index: usize, slot: TokenSlot) -> SampleHook {
    Arc::new(move |k, i| {
        if k == kind && i == index {
            if let Some(token) = slot.lock().unwrap().as_ref() {
                token.cancel();
            }
        }
    })
}
