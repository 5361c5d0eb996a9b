//! Undo journal over a ledger.

use std::collections::BTreeMap;

use budgetctl_shared::types::{BudgetControlId, BudgetLineId};
use rust_decimal::Decimal;

use crate::budget::{BudgetControlSheet, BudgetError, BudgetLedger};

/// Ledger wrapper that remembers the first amount it overwrote for every
/// line, so a failed batch can be put back exactly as it was found.
#[derive(Debug)]
pub struct Journal<'a, L: BudgetLedger + ?Sized> {
    inner: &'a mut L,
    before: BTreeMap<BudgetLineId, Decimal>,
}

impl<'a, L: BudgetLedger + ?Sized> Journal<'a, L> {
    /// Starts journaling writes to `inner`.
    pub fn new(inner: &'a mut L) -> Self {
        Self {
            inner,
            before: BTreeMap::new(),
        }
    }

    /// Lines written so far.
    pub fn touched(&self) -> impl Iterator<Item = BudgetLineId> + '_ {
        self.before.keys().copied()
    }

    /// Restores every line written through the journal.
    ///
    /// # Errors
    ///
    /// Returns the first ledger error hit while restoring.
    pub fn undo(self) -> Result<(), BudgetError> {
        for (line, amount) in self.before {
            self.inner.set_amount(line, amount)?;
        }
        Ok(())
    }
}

impl<L: BudgetLedger + ?Sized> BudgetLedger for Journal<'_, L> {
    fn amount(&self, line: BudgetLineId) -> Result<Decimal, BudgetError> {
        self.inner.amount(line)
    }

    fn set_amount(&mut self, line: BudgetLineId, amount: Decimal) -> Result<(), BudgetError> {
        if !self.before.contains_key(&line) {
            let current = self.inner.amount(line)?;
            self.before.insert(line, current);
        }
        self.inner.set_amount(line, amount)
    }

    fn sheet_of(&self, line: BudgetLineId) -> Result<Option<BudgetControlId>, BudgetError> {
        self.inner.sheet_of(line)
    }

    fn sheet(&self, id: BudgetControlId) -> Result<&BudgetControlSheet, BudgetError> {
        self.inner.sheet(id)
    }

    fn lines_of_sheet(&self, sheet: BudgetControlId) -> Result<Vec<BudgetLineId>, BudgetError> {
        self.inner.lines_of_sheet(sheet)
    }
}
