//! Backend module for the analysis library seam
//!
//! All numerical work happens inside the analysis library. This module defines
//! the handle traits the rest of the crate programs against and provides the
//! implementations behind them.
//!
//! # Components
//!
//! - [`ProblemBackend`] - Static problem definition (names, types, bounds, membership)
//! - [`AnalysisBackend`] - Sampling, temporary bounds, results and histograms
//! - [`ProblemLoader`] - Opens problem instances from files
//! - [`MockLibrary`] - Scripted in-process library (feature-gated, on by default)
//! - [`NativeLibrary`] - Binding to `libmprobe` (feature-gated)
//!
//! # Example
//!
//! ```ignore
//! use mprobe_workshop::backend::{MockLibrary, MockProblem, ProblemLoader};
//!
//! let library = MockLibrary::new().with_instance("model.nl", MockProblem::sample());
//! let problem = library.open(&["model.nl".into()])?;
//! let mut analysis = problem.create_analysis()?;
//! analysis.sample(FunctionKind::Constraint, 0, false)?;
//! ```

pub mod library_trait;
#[cfg(feature = "mock-library")]
pub mod mock_library;
#[cfg(feature = "native")]
pub mod native;

pub use library_trait::{AnalysisBackend, ProblemBackend, ProblemLoader};

#[cfg(feature = "mock-library")]
pub use mock_library::{
    MockConstraint, MockFailure, MockLibrary, MockObjective, MockProblem, SampleHook,
};
#[cfg(feature = "native")]
pub use native::{NativeAnalysis, NativeLibrary, NativeProblem};
