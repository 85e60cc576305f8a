//! # MProbe Workshop: table views over a problem analysis library
//!
//! Browses the variables, constraints and objectives of a mathematical
//! programming problem as tables, launches empirical shape analyses in the
//! background and filters rows by type, shape and cross-references. All
//! numerical work is done by the analysis library behind [`backend`].
//!
//! ## Architecture
//!
//! - **Backend**: Problem and analysis handle traits, a scripted mock library and the native binding
//! - **State**: Shared problem/analysis holders that publish change events
//! - **Tables**: Column schemas and cell values with sentinels for missing results
//! - **Filters**: Composable row predicates with a reverse toggle
//! - **Workshops**: Table + filter + background task launcher, coordinated by a [`Session`]
//!
//! ## Configuration
//!
//! Settings (trace file, default analysis settings, histogram bins) are
//! stored in the platform data directory under `org.mprobe.workshop`:
//!
//! - **Linux**: `~/.local/share/org.mprobe.workshop/`
//! - **macOS**: `~/Library/Application Support/org.mprobe.workshop/`
//! - **Windows**: `%APPDATA%\org.mprobe.workshop\`
//!
//! ## Example
//!
//! ```ignore
//! use mprobe_workshop::{AppConfig, EntityKind, Session};
//! use mprobe_workshop::backend::{MockLibrary, MockProblem};
//!
//! let library = MockLibrary::new().with_instance("sample.nl", MockProblem::sample());
//! let mut session = Session::new(AppConfig::load_or_default());
//! session.load(&library, &["sample.nl".into()])?;
//!
//! let constraints = session.open_workshop(EntityKind::Constraint);
//! let workshop = session.workshop_mut(constraints).unwrap();
//! workshop.select_preset("Linear")?;
//! workshop.analyze_all()?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod histogram;
pub mod session;
pub mod state;
pub mod statistics;
pub mod table;
pub mod trace;
pub mod types;
pub mod worker;
pub mod workshop;

// Re-export commonly used types
pub use backend::{AnalysisBackend, ProblemBackend, ProblemLoader};
pub use config::AppConfig;
pub use error::{Result, WorkshopError};
pub use filter::{FilterEngine, RowPredicate};
pub use session::{Session, WorkshopId};
pub use table::{CellValue, EntityKind, TableModel};
pub use worker::{AnalysisTask, TaskEvent, TaskOutcome};
pub use workshop::Workshop;
