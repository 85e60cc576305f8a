//! Observable state holders shared between views and background tasks
//!
//! - [`ProblemState`] - The loaded problem instance
//! - [`AnalysisState`] - The analysis handle, settings and the `analysing` projection
//! - [`ChangeHub`] / [`Subscription`] - Event fan-out used by both holders
//!
//! Both holders are created once and shared as `Arc`s; they outlive any
//! number of views bound to them.

pub mod analysis;
pub mod observe;
pub mod problem;

pub use analysis::{AnalysingGuard, AnalysisState, ReadAccess};
pub use observe::{ChangeHub, StateEvent, Subscription};
pub use problem::ProblemState;
