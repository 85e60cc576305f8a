//! Row predicates
//!
//! A [`RowPredicate`] is a pure function of `(source, row)`. Nothing is cached:
//! every evaluation reads the current cell values, so a predicate stays valid
//! across analyses and bound edits.
//!
//! Evaluation is tri-state. A leaf that reads a sentinel cell (empty,
//! unavailable or error) is [`Decision::Undecided`]; negation keeps it
//! undecided and [`RowPredicate::include`] lets undecided rows through.
//!
//! Equality compares in the semantic type of the column when the source
//! knows it: on a real column `Integer(-1)` matches a cell of `-1.0`.

use crate::table::{CellValue, ColumnKind, TableModel};

/// Anything rows can be filtered over
pub trait RowSource {
    fn rows(&self) -> usize;
    fn cell(&self, row: usize, column: usize) -> CellValue;

    /// Semantic type of a column, if known
    fn column_kind(&self, _column: usize) -> Option<ColumnKind> {
        None
    }
}

impl<T: TableModel + ?Sized> RowSource for T {
    fn rows(&self) -> usize {
        self.row_count()
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        self.value(row, column)
    }

    fn column_kind(&self, column: usize) -> Option<ColumnKind> {
        self.column(column).map(|c| c.kind)
    }
}

/// Whole-number value of a numeric cell
fn integral(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Integer(v) => Some(*v),
        CellValue::Real(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

/// Equality after coercing both sides to the column's type
fn coerced_eq(kind: Option<ColumnKind>, value: &CellValue, target: &CellValue) -> bool {
    let coerced = match kind {
        Some(ColumnKind::Real) => value.as_real().zip(target.as_real()).map(|(a, b)| a == b),
        Some(ColumnKind::Integer) => integral(value).zip(integral(target)).map(|(a, b)| a == b),
        _ => None,
    };
    coerced.unwrap_or_else(|| value == target)
}

/// Outcome of evaluating a predicate on one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Exclude,
    /// The queried cell held a sentinel
    Undecided,
}

impl Decision {
    fn from_bool(include: bool) -> Self {
        if include {
            Decision::Include
        } else {
            Decision::Exclude
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Decision::Include => Decision::Exclude,
            Decision::Exclude => Decision::Include,
            Decision::Undecided => Decision::Undecided,
        }
    }
}

/// Entity ids sorted and de-duplicated once, searched by bisection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedIds(Vec<usize>);

impl SortedIds {
    pub fn new(ids: impl IntoIterator<Item = usize>) -> Self {
        let mut ids: Vec<usize> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl FromIterator<usize> for SortedIds {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A negated predicate
///
/// Only [`RowPredicate::negate`] builds one, so negations never nest.
#[derive(Debug, Clone, PartialEq)]
pub struct Negated(Box<RowPredicate>);

impl Negated {
    pub fn inner(&self) -> &RowPredicate {
        &self.0
    }
}

/// Row filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum RowPredicate {
    /// Accept every row
    All,
    /// Accept rows whose cell in `column` equals `target`
    Equals { column: usize, target: CellValue },
    /// Accept rows whose id in `column` is one of `ids`
    Membership { column: usize, ids: SortedIds },
    Not(Negated),
}

impl RowPredicate {
    pub fn equals(column: usize, target: impl Into<CellValue>) -> Self {
        RowPredicate::Equals {
            column,
            target: target.into(),
        }
    }

    pub fn membership(column: usize, ids: impl IntoIterator<Item = usize>) -> Self {
        RowPredicate::Membership {
            column,
            ids: SortedIds::new(ids),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RowPredicate::All)
    }

    /// Logical negation, unwrapping an existing negation instead of nesting
    pub fn negate(self) -> Self {
        match self {
            RowPredicate::Not(Negated(inner)) => *inner,
            other => RowPredicate::Not(Negated(Box::new(other))),
        }
    }

    /// Evaluate on one row
    pub fn evaluate<S: RowSource + ?Sized>(&self, source: &S, row: usize) -> Decision {
        match self {
            RowPredicate::All => Decision::Include,
            RowPredicate::Equals { column, target } => {
                let value = source.cell(row, *column);
                if value.is_sentinel() {
                    Decision::Undecided
                } else {
                    Decision::from_bool(coerced_eq(source.column_kind(*column), &value, target))
                }
            }
            RowPredicate::Membership { column, ids } => match source.cell(row, *column) {
                value if value.is_sentinel() => Decision::Undecided,
                value => Decision::from_bool(
                    value
                        .as_integer()
                        .and_then(|id| usize::try_from(id).ok())
                        .is_some_and(|id| ids.contains(id)),
                ),
            },
            RowPredicate::Not(negated) => negated.inner().evaluate(source, row).negate(),
        }
    }

    /// Whether the row is shown; undecided rows are shown
    pub fn include<S: RowSource + ?Sized>(&self, source: &S, row: usize) -> bool {
        self.evaluate(source, row) != Decision::Exclude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::UnavailableReason;
    use crate::types::FunctionShape;
    use proptest::prelude::*;

    /// In-memory rows, column 0 holds the id
    struct Grid(Vec<Vec<CellValue>>);

    impl RowSource for Grid {
        fn rows(&self) -> usize {
            self.0.len()
        }

        fn cell(&self, row: usize, column: usize) -> CellValue {
            self.0
                .get(row)
                .and_then(|r| r.get(column))
                .cloned()
                .unwrap_or(CellValue::Error)
        }
    }

    fn shapes(shapes: &[Option<FunctionShape>]) -> Grid {
        Grid(
            shapes
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let shape = match s {
                        Some(s) => CellValue::from(*s),
                        None => CellValue::Unavailable(UnavailableReason::InProgress),
                    };
                    vec![CellValue::index(i), shape]
                })
                .collect(),
        )
    }

    fn predicate_strategy() -> impl Strategy<Value = RowPredicate> {
        prop_oneof![
            Just(RowPredicate::All),
            (0usize..3).prop_map(|c| RowPredicate::equals(c, FunctionShape::Linear)),
            prop::collection::vec(0usize..20, 0..8).prop_map(|ids| RowPredicate::membership(0, ids)),
        ]
    }

    #[test]
    fn test_equals_with_fail_open() {
        let grid = shapes(&[Some(FunctionShape::Linear), Some(FunctionShape::Nonlinear), None]);
        let linear = RowPredicate::equals(1, FunctionShape::Linear);
        assert_eq!(linear.evaluate(&grid, 0), Decision::Include);
        assert_eq!(linear.evaluate(&grid, 1), Decision::Exclude);
        assert_eq!(linear.evaluate(&grid, 2), Decision::Undecided);
        assert!(linear.include(&grid, 2));

        let reversed = linear.negate();
        assert!(!reversed.include(&grid, 0));
        assert!(reversed.include(&grid, 1));
        assert!(reversed.include(&grid, 2));
    }

    /// Grid whose columns are (ID: integer, BOUND: real)
    struct TypedGrid(Grid);

    impl RowSource for TypedGrid {
        fn rows(&self) -> usize {
            self.0.rows()
        }

        fn cell(&self, row: usize, column: usize) -> CellValue {
            self.0.cell(row, column)
        }

        fn column_kind(&self, column: usize) -> Option<ColumnKind> {
            match column {
                0 => Some(ColumnKind::Integer),
                1 => Some(ColumnKind::Real),
                _ => None,
            }
        }
    }

    #[test]
    fn test_equals_coerces_to_column_kind() {
        let grid = TypedGrid(Grid(vec![
            vec![CellValue::Integer(0), CellValue::Real(-1.0)],
            vec![CellValue::Integer(1), CellValue::Real(-0.5)],
        ]));
        let integer_target = RowPredicate::equals(1, CellValue::Integer(-1));
        assert_eq!(integer_target.evaluate(&grid, 0), Decision::Include);
        assert_eq!(integer_target.evaluate(&grid, 1), Decision::Exclude);

        let real_id = RowPredicate::equals(0, CellValue::Real(1.0));
        assert_eq!(real_id.evaluate(&grid, 0), Decision::Exclude);
        assert_eq!(real_id.evaluate(&grid, 1), Decision::Include);
        let fractional_id = RowPredicate::equals(0, CellValue::Real(1.5));
        assert_eq!(fractional_id.evaluate(&grid, 1), Decision::Exclude);

        // without a column kind the comparison stays exact
        assert_eq!(integer_target.evaluate(&grid.0, 0), Decision::Exclude);
    }

    #[test]
    fn test_error_cells_fail_open() {
        let grid = shapes(&[Some(FunctionShape::Quadratic)]);
        let out_of_range = RowPredicate::equals(5, FunctionShape::Linear);
        assert_eq!(out_of_range.evaluate(&grid, 0), Decision::Undecided);
    }

    #[test]
    fn test_membership_ignores_input_order() {
        let grid = shapes(&[None, None, None, None, None]);
        let a = RowPredicate::membership(0, [3, 1, 1]);
        let b = RowPredicate::membership(0, [1, 3]);
        assert_eq!(a, b);
        let rows: Vec<usize> = (0..grid.rows()).filter(|&r| a.include(&grid, r)).collect();
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn test_sorted_ids() {
        let ids: SortedIds = [9, 2, 5, 2].into_iter().collect();
        assert_eq!(ids.as_slice(), &[2, 5, 9]);
        assert!(ids.contains(5));
        assert!(!ids.contains(4));
        assert_eq!(ids.len(), 3);
        assert!(SortedIds::default().is_empty());
    }

    proptest! {
        #[test]
        fn prop_double_negation_is_identity(p in predicate_strategy()) {
            prop_assert_eq!(p.clone().negate().negate(), p.clone());
            prop_assert_eq!(p.clone().negate().negate().negate(), p.negate());
        }

        #[test]
        fn prop_membership_matches_set(
            ids in prop::collection::vec(0usize..30, 0..15),
            rows in 0usize..30,
        ) {
            let grid = shapes(&vec![None; rows]);
            let predicate = RowPredicate::membership(0, ids.iter().rev().copied());
            for row in 0..rows {
                prop_assert_eq!(predicate.include(&grid, row), ids.contains(&row));
            }
        }
    }
}
