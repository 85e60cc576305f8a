//! Per-view filter state: the installed predicate and the reverse toggle

use super::predicate::{RowPredicate, RowSource};

/// Active filter of one workshop view
///
/// The active predicate is always the base filter, negated exactly once when
/// reverse selection is on. `All` is never negated.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEngine {
    base: RowPredicate,
    active: RowPredicate,
    reverse: bool,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEngine {
    pub fn new() -> Self {
        Self {
            base: RowPredicate::All,
            active: RowPredicate::All,
            reverse: false,
        }
    }

    /// Install a named filter, keeping the reverse toggle
    pub fn select(&mut self, base: RowPredicate) {
        self.active = if self.reverse && !base.is_all() {
            base.clone().negate()
        } else {
            base.clone()
        };
        self.base = base;
        tracing::trace!("Filter installed: {:?}", self.active);
    }

    /// Install a related-entity filter, replacing the current one
    ///
    /// Reverse selection is switched off so the related rows are shown.
    pub fn install_related(&mut self, predicate: RowPredicate) {
        self.reverse = false;
        self.select(predicate);
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        if reverse != self.reverse {
            self.toggle_reverse();
        }
    }

    /// Flip reverse selection, negating the active predicate once
    pub fn toggle_reverse(&mut self) {
        self.reverse = !self.reverse;
        if !self.base.is_all() {
            let active = std::mem::replace(&mut self.active, RowPredicate::All);
            self.active = active.negate();
        }
        tracing::trace!("Reverse selection {}", if self.reverse { "on" } else { "off" });
    }

    /// Named filter without the reverse negation
    pub fn base(&self) -> &RowPredicate {
        &self.base
    }

    pub fn active(&self) -> &RowPredicate {
        &self.active
    }

    pub fn include<S: RowSource + ?Sized>(&self, source: &S, row: usize) -> bool {
        self.active.include(source, row)
    }

    /// Rows passing the active filter, in row order
    pub fn visible_rows<S: RowSource + ?Sized>(&self, source: &S) -> Vec<usize> {
        (0..source.rows())
            .filter(|&row| self.active.include(source, row))
            .collect()
    }

    pub fn visible_count<S: RowSource + ?Sized>(&self, source: &S) -> usize {
        (0..source.rows())
            .filter(|&row| self.active.include(source, row))
            .count()
    }
}
