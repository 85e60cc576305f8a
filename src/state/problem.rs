//! Observable holder for the loaded problem instance

use crate::backend::{ProblemBackend, ProblemLoader};
use crate::error::{Result, WorkshopError};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use super::observe::{ChangeHub, StateEvent, Subscription};

/// Shared, observable problem handle
///
/// Views hold an `Arc<ProblemState>` and read through [`ProblemState::problem`];
/// loading and unloading broadcast [`StateEvent`]s to every subscriber.
pub struct ProblemState {
    problem: RwLock<Option<Arc<dyn ProblemBackend>>>,
    hub: ChangeHub<StateEvent>,
}

impl ProblemState {
    /// Create an unloaded holder
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            problem: RwLock::new(None),
            hub: ChangeHub::new(),
        })
    }

    /// Open `files` through `loader`, replacing any loaded problem
    ///
    /// On failure the holder is left unloaded and the error is returned.
    pub fn load(&self, loader: &dyn ProblemLoader, files: &[PathBuf]) -> Result<()> {
        self.unload();
        let problem = loader.open(files).map_err(|e| match e {
            WorkshopError::Load(_) => e,
            other => WorkshopError::Load(other.to_string()),
        })?;
        self.set_problem(problem);
        Ok(())
    }

    /// Install an already opened problem
    pub fn set_problem(&self, problem: Box<dyn ProblemBackend>) {
        let name = problem.instance_name().unwrap_or_default();
        *self.problem.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(problem));
        tracing::info!("Problem instance '{}' loaded", name);
        self.hub.publish(StateEvent::ProblemLoaded);
    }

    pub fn unload(&self) {
        let previous = self
            .problem
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            tracing::info!("Problem instance unloaded");
            self.hub.publish(StateEvent::ProblemUnloaded);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.problem
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current problem handle, if loaded
    pub fn problem(&self) -> Option<Arc<dyn ProblemBackend>> {
        self.problem
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current problem handle or [`WorkshopError::NotLoaded`]
    pub fn require(&self) -> Result<Arc<dyn ProblemBackend>> {
        self.problem().ok_or(WorkshopError::NotLoaded("problem"))
    }

    /// Instance name, empty when unloaded or unnamed
    pub fn instance_name(&self) -> String {
        self.problem()
            .and_then(|p| p.instance_name().ok())
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> Subscription<StateEvent> {
        self.hub.subscribe()
    }
}
