//! Table adapters over the problem and analysis state
//!
//! Each entity kind gets an adapter exposing a row/column contract. Rows are
//! entity indices in the backing problem; columns come from a fixed schema.
//! Adapters never cache values: every [`TableModel::value`] call reads
//! through to the backend, mapping unloaded state, running analyses and
//! failures to [`CellValue`] sentinels.
//!
//! # Components
//!
//! - [`TableModel`] - Row/column contract shared by the adapters
//! - [`VariableTable`] - Variables, with editable temporary bounds
//! - [`ConstraintTable`] - Constraints and their analysis results
//! - [`ObjectiveTable`] - Objectives and their analysis results
//! - [`StateBinding`] - Subscriptions and the sentinel policy
//!
//! # Example
//!
//! ```ignore
//! let table = ConstraintTable::new(analysis.clone());
//! for row in 0..table.row_count() {
//!     println!("{}", table.value(row, ConstraintColumn::Name.index()));
//! }
//! ```

pub mod binding;
pub mod column;
pub mod constraints;
pub mod objectives;
pub mod value;
pub mod variables;

pub use binding::{outcome_cell, StateBinding, TableEvent};
pub use column::{
    ColumnDescriptor, ColumnKind, ConstraintColumn, ObjectiveColumn, VariableColumn,
    CONSTRAINT_SCHEMA, OBJECTIVE_SCHEMA, VARIABLE_SCHEMA,
};
pub use constraints::ConstraintTable;
pub use objectives::ObjectiveTable;
pub use value::{CellValue, EnumValue, UnavailableReason};
pub use variables::{VariableTable, BOUNDS_ERROR};

use crate::error::{Result, WorkshopError};
use crate::state::Subscription;
use crate::types::FunctionKind;
use std::fmt;

/// Entity kinds shown in the workshops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Variable,
    Constraint,
    Objective,
}

impl EntityKind {
    /// Function kind used by the analysis library, `None` for variables
    pub fn function_kind(&self) -> Option<FunctionKind> {
        match self {
            EntityKind::Variable => None,
            EntityKind::Constraint => Some(FunctionKind::Constraint),
            EntityKind::Objective => Some(FunctionKind::Objective),
        }
    }

    /// Plural title used for workshop windows
    pub fn title(&self) -> &'static str {
        match self {
            EntityKind::Variable => "Variables",
            EntityKind::Constraint => "Constraints",
            EntityKind::Objective => "Objectives",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            EntityKind::Variable => "variable",
            EntityKind::Constraint => "constraint",
            EntityKind::Objective => "objective",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Row/column contract of a table adapter
///
/// Implementations are `Send + Sync` so a workshop can be read from any
/// thread; reads never block on the analysis handle.
pub trait TableModel: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// The static column schema
    fn schema(&self) -> &'static [ColumnDescriptor];

    fn binding(&self) -> &StateBinding;

    fn column_count(&self) -> usize {
        self.schema().len()
    }

    fn column(&self, column: usize) -> Option<&'static ColumnDescriptor> {
        self.schema().get(column)
    }

    /// Number of entities, zero while the problem is unloaded
    fn row_count(&self) -> usize;

    /// Value of one cell, or a sentinel
    fn value(&self, row: usize, column: usize) -> CellValue;

    /// Column holding the entity identifier
    fn identifier_column(&self) -> usize;

    fn is_editable(&self, _row: usize, _column: usize) -> bool {
        false
    }

    /// Commit an edited cell
    fn set_value(&self, row: usize, column: usize, _value: CellValue) -> Result<()> {
        Err(read_only(self.kind(), self.column(column), row))
    }

    /// Re-publish `DataChanged` if either holder changed since the last call
    fn refresh(&self) -> bool {
        self.binding().refresh()
    }

    fn subscribe(&self) -> Subscription<TableEvent> {
        self.binding().subscribe()
    }
}

fn read_only(kind: EntityKind, column: Option<&ColumnDescriptor>, row: usize) -> WorkshopError {
    let header = column.map(|c| c.header).unwrap_or("?");
    WorkshopError::Validation(format!(
        "Column '{}' of {} {} is read-only",
        header,
        kind.noun(),
        row
    ))
}

/// Out-of-schema column read
fn unknown_column(kind: EntityKind, column: usize) -> CellValue {
    tracing::warn!("{} table has no column {}", kind.noun(), column);
    CellValue::Error
}
