//! Row filtering for the workshop views
//!
//! # Components
//!
//! - [`RowPredicate`] - Closed set of composable row predicates
//! - [`FilterEngine`] - Active predicate plus the reverse-selection toggle
//! - [`presets`] - Named filters offered by each workshop
//!
//! Cells that hold a sentinel never hide a row: filtering fails open while
//! results are missing or being computed.

pub mod engine;
pub mod predicate;
pub mod presets;

pub use engine::FilterEngine;
pub use predicate::{Decision, Negated, RowPredicate, RowSource, SortedIds};
pub use presets::{preset, presets, NamedFilter};
