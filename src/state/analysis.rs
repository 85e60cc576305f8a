//! Observable holder for the analysis handle
//!
//! The analysis handle is owned exclusively by [`AnalysisState`] behind a
//! mutex. Background tasks take the lock for each step; views only ever
//! `try_lock`, so a handle busy inside a long native call reads as
//! [`ReadAccess::Busy`] instead of blocking the caller.
//!
//! # The `analysing` Projection
//!
//! [`AnalysisState::begin_analysis`] returns an RAII [`AnalysingGuard`]. The
//! projection is true while at least one guard is alive, so a task launcher
//! takes the guard on its own thread before spawning and hands it to the task,
//! which drops it only when it has finished.

use crate::backend::{AnalysisBackend, ProblemBackend};
use crate::config::{AnalysisSettings, HistogramBins};
use crate::error::{Result, ResultExt, WorkshopError};
use crate::histogram::{BinLayout, HistType, HistogramStats};
use crate::types::Bounds;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use super::observe::{ChangeHub, StateEvent, Subscription};
use super::problem::ProblemState;

/// Result of a non-blocking read of the analysis handle
#[derive(Debug, Clone, PartialEq)]
pub enum ReadAccess<T> {
    /// No analysis handle exists
    Unloaded,
    /// Another thread holds the handle
    Busy,
    /// The read ran
    Value(T),
}

/// Shared, observable analysis handle
pub struct AnalysisState {
    problem: Arc<ProblemState>,
    handle: Mutex<Option<Box<dyn AnalysisBackend>>>,
    loaded: AtomicBool,
    analysing: AtomicUsize,
    settings: Mutex<AnalysisSettings>,
    bins: Mutex<HistogramBins>,
    hub: ChangeHub<StateEvent>,
}

impl AnalysisState {
    /// Create a holder bound to `problem`, without an analysis handle
    pub fn new(problem: Arc<ProblemState>) -> Arc<Self> {
        Self::with_settings(problem, AnalysisSettings::default(), HistogramBins::default())
    }

    pub fn with_settings(
        problem: Arc<ProblemState>,
        settings: AnalysisSettings,
        bins: HistogramBins,
    ) -> Arc<Self> {
        Arc::new(Self {
            problem,
            handle: Mutex::new(None),
            loaded: AtomicBool::new(false),
            analysing: AtomicUsize::new(0),
            settings: Mutex::new(settings),
            bins: Mutex::new(bins),
            hub: ChangeHub::new(),
        })
    }

    /// The problem holder this analysis belongs to
    pub fn problem_state(&self) -> &Arc<ProblemState> {
        &self.problem
    }

    fn lock_handle(&self) -> MutexGuard<'_, Option<Box<dyn AnalysisBackend>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a fresh analysis handle for the current problem
    ///
    /// Drops the old handle first. With no problem loaded the holder ends up
    /// unloaded. The stored settings and histogram bins are pushed into the
    /// new handle.
    pub fn rebind(&self) -> Result<()> {
        let mut guard = self.lock_handle();
        *guard = None;
        self.loaded.store(false, Ordering::SeqCst);

        let created = match self.problem.problem() {
            Some(problem) => self.create_configured(problem.as_ref()).map(Some),
            None => Ok(None),
        };
        let result = match created {
            Ok(Some(analysis)) => {
                *guard = Some(analysis);
                self.loaded.store(true, Ordering::SeqCst);
                tracing::info!("Analysis handle created");
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::warn!("{}", e);
                Err(e)
            }
        };
        drop(guard);
        self.hub.publish(StateEvent::AnalysisReplaced);
        result
    }

    fn create_configured(&self, problem: &dyn ProblemBackend) -> Result<Box<dyn AnalysisBackend>> {
        let mut analysis = problem
            .create_analysis()
            .context("Failed to create analysis")?;
        analysis.apply_settings(&self.settings())?;
        for (hist, layout) in self.histogram_bins().iter() {
            analysis.set_histogram_bins(hist, layout)?;
        }
        Ok(analysis)
    }

    /// Drop the analysis handle
    pub fn release(&self) {
        let had = self.lock_handle().take().is_some();
        self.loaded.store(false, Ordering::SeqCst);
        if had {
            self.hub.publish(StateEvent::AnalysisReplaced);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// True while any background analysis is running
    pub fn is_analysing(&self) -> bool {
        self.analysing.load(Ordering::SeqCst) > 0
    }

    /// Mark the start of a background analysis
    pub fn begin_analysis(self: &Arc<Self>) -> AnalysingGuard {
        if self.analysing.fetch_add(1, Ordering::SeqCst) == 0 {
            self.hub.publish(StateEvent::AnalysingChanged(true));
        }
        AnalysingGuard {
            state: Arc::clone(self),
        }
    }

    /// Run `read` on the handle if it is free right now
    pub fn try_read<R>(&self, read: impl FnOnce(&dyn AnalysisBackend) -> R) -> ReadAccess<R> {
        let guard = match self.handle.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return ReadAccess::Busy,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        match guard.as_deref() {
            Some(handle) => ReadAccess::Value(read(handle)),
            None => ReadAccess::Unloaded,
        }
    }

    /// Run `f` with exclusive access to the handle, waiting for the lock
    pub fn with_handle<R>(
        &self,
        f: impl FnOnce(&mut dyn AnalysisBackend) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.lock_handle();
        match guard.as_deref_mut() {
            Some(handle) => f(handle),
            None => Err(WorkshopError::NotLoaded("analysis")),
        }
    }

    /// Run `f` on the handle only while no analysis is running
    ///
    /// The check is repeated under the lock, so a task launched meanwhile
    /// cannot interleave with `f`.
    fn with_idle_handle<R>(
        &self,
        f: impl FnOnce(&mut dyn AnalysisBackend) -> Result<R>,
    ) -> Result<R> {
        if self.is_analysing() {
            return Err(WorkshopError::Busy);
        }
        self.with_handle(|a| {
            if self.is_analysing() {
                return Err(WorkshopError::Busy);
            }
            f(a)
        })
    }

    /// Tell subscribers that analysis results changed
    pub fn notify_data_changed(&self) {
        self.hub.publish(StateEvent::AnalysisDataChanged);
    }

    /// Temporary bounds of a variable (blocking)
    pub fn bounds(&self, variable: usize) -> Result<Bounds> {
        self.with_handle(|a| a.bounds(variable))
    }

    pub fn set_bounds(&self, variable: usize, bounds: Bounds) -> Result<()> {
        self.with_handle(|a| a.set_bounds(variable, bounds))?;
        tracing::debug!(
            "Temporary bounds of variable {} set to [{}, {}]",
            variable,
            bounds.lower,
            bounds.upper
        );
        self.hub.publish(StateEvent::BoundsChanged);
        Ok(())
    }

    /// Read, check and commit the temporary bounds of a variable in one step
    ///
    /// `update` maps the current temporary bounds to the new ones or rejects
    /// them. Fails with [`WorkshopError::Busy`] while an analysis is running.
    pub fn update_bounds(
        &self,
        variable: usize,
        update: impl FnOnce(Bounds) -> Result<Bounds>,
    ) -> Result<()> {
        let bounds = self.with_idle_handle(|a| {
            let bounds = update(a.bounds(variable)?)?;
            a.set_bounds(variable, bounds)?;
            Ok(bounds)
        })?;
        tracing::debug!(
            "Temporary bounds of variable {} set to [{}, {}]",
            variable,
            bounds.lower,
            bounds.upper
        );
        self.hub.publish(StateEvent::BoundsChanged);
        Ok(())
    }

    /// Restore all temporary bounds to the original bounds
    pub fn reset_bounds(&self) -> Result<()> {
        self.with_idle_handle(|a| a.reset_bounds())?;
        self.hub.publish(StateEvent::BoundsChanged);
        Ok(())
    }

    pub fn settings(&self) -> AnalysisSettings {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate and store settings, pushing them into the handle if loaded
    pub fn apply_settings(&self, settings: AnalysisSettings) -> Result<()> {
        settings.validate()?;
        if self.is_loaded() {
            self.with_idle_handle(|a| a.apply_settings(&settings))?;
        }
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings;
        self.hub.publish(StateEvent::SettingsChanged);
        Ok(())
    }

    pub fn histogram_bins(&self) -> HistogramBins {
        self.bins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_histogram_bins(&self, hist: HistType, layout: BinLayout) -> Result<()> {
        layout.validate()?;
        if self.is_loaded() {
            self.with_idle_handle(|a| a.set_histogram_bins(hist, &layout))?;
        }
        self.bins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(hist, layout)?;
        self.hub.publish(StateEvent::SettingsChanged);
        Ok(())
    }

    /// Snapshot of one extra histogram
    ///
    /// Never waits for the handle: fails with [`WorkshopError::Busy`] while
    /// an analysis is running.
    pub fn histogram(&self, hist: HistType) -> Result<HistogramStats> {
        if self.is_analysing() {
            return Err(WorkshopError::Busy);
        }
        match self.try_read(|a| a.histogram(hist)) {
            ReadAccess::Value(stats) => stats,
            ReadAccess::Busy => Err(WorkshopError::Busy),
            ReadAccess::Unloaded => Err(WorkshopError::NotLoaded("analysis")),
        }
    }

    pub fn subscribe(&self) -> Subscription<StateEvent> {
        self.hub.subscribe()
    }
}

/// Keeps the `analysing` projection true while alive
#[must_use = "the analysis is only marked as running while the guard lives"]
pub struct AnalysingGuard {
    state: Arc<AnalysisState>,
}

impl AnalysingGuard {
    pub fn state(&self) -> &Arc<AnalysisState> {
        &self.state
    }
}

impl Drop for AnalysingGuard {
    fn drop(&mut self) {
        if self.state.analysing.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.hub.publish(StateEvent::AnalysingChanged(false));
        }
    }
}
