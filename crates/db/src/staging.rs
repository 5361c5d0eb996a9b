//! Snapshot of the budget data one batch operation reads and writes.

use std::collections::{BTreeMap, BTreeSet};

use budgetctl_core::budget::{BudgetBook, BudgetControlSheet, BudgetError, BudgetLedger};
use budgetctl_core::transfer::BudgetTransfer;
use budgetctl_shared::types::{BudgetControlId, BudgetLineId};
use rust_decimal::Decimal;

use crate::store::StoreState;

/// Copy of every sheet and line a batch can reach, plus the versions they
/// had when copied.
///
/// The engine runs against this copy without holding the store lock.
/// [`StagedLedger::is_current`] tells whether the copy can still be
/// published, and [`StagedLedger::apply`] publishes the changed lines.
#[derive(Debug)]
pub(crate) struct StagedLedger {
    book: BudgetBook,
    read_versions: BTreeMap<BudgetLineId, u64>,
    structure_version: u64,
    dirty: BTreeSet<BudgetLineId>,
}

impl StagedLedger {
    /// Copies the sheets a batch touches, the sheets of every line it
    /// selects, and selected lines that have no sheet.
    pub(crate) fn snapshot(state: &StoreState, batch: &BudgetTransfer) -> Result<Self, BudgetError> {
        let referenced = batch.referenced_lines();
        let mut sheets = batch.touched_sheets();
        let mut orphans = Vec::new();
        for entry in referenced.iter().filter_map(|line| state.book.line(*line).ok()) {
            match entry.sheet_id {
                Some(sheet) => {
                    sheets.insert(sheet);
                }
                None => orphans.push(entry.clone()),
            }
        }

        let mut book = state.book.subset(&sheets);
        for line in orphans {
            book.insert_line(line)?;
        }

        let read_versions = book
            .lines()
            .map(|line| (line.id, state.line_version(line.id)))
            .collect();

        Ok(Self {
            book,
            read_versions,
            structure_version: state.structure_version,
            dirty: BTreeSet::new(),
        })
    }

    /// Whether nothing this snapshot read has changed in `state`.
    pub(crate) fn is_current(&self, state: &StoreState) -> bool {
        self.structure_version == state.structure_version
            && self
                .read_versions
                .iter()
                .all(|(line, version)| state.line_version(*line) == *version)
    }

    /// Lines written through this ledger.
    pub(crate) fn dirty(&self) -> &BTreeSet<BudgetLineId> {
        &self.dirty
    }

    /// Copies every written line into `state` and bumps its version.
    pub(crate) fn apply(self, state: &mut StoreState) -> Result<(), BudgetError> {
        for line in &self.dirty {
            let amount = self.book.amount(*line)?;
            state.book.set_amount(*line, amount)?;
            state.bump_line(*line);
        }
        Ok(())
    }
}

impl BudgetLedger for StagedLedger {
    fn amount(&self, line: BudgetLineId) -> Result<Decimal, BudgetError> {
        self.book.amount(line)
    }

    fn set_amount(&mut self, line: BudgetLineId, amount: Decimal) -> Result<(), BudgetError> {
        self.book.set_amount(line, amount)?;
        self.dirty.insert(line);
        Ok(())
    }

    fn sheet_of(&self, line: BudgetLineId) -> Result<Option<BudgetControlId>, BudgetError> {
        self.book.sheet_of(line)
    }

    fn sheet(&self, id: BudgetControlId) -> Result<&BudgetControlSheet, BudgetError> {
        self.book.sheet(id)
    }

    fn lines_of_sheet(&self, sheet: BudgetControlId) -> Result<Vec<BudgetLineId>, BudgetError> {
        self.book.lines_of_sheet(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetctl_core::budget::{BudgetLine, BudgetScope};
    use budgetctl_core::transfer::TransferItem;
    use rust_decimal_macros::dec;

    struct Fixture {
        state: StoreState,
        batch: BudgetTransfer,
        source: BudgetLineId,
        target: BudgetLineId,
        bystander: BudgetLineId,
    }

    fn fixture() -> Fixture {
        let mut state = StoreState::default();
        let scope = state.book.insert_scope(BudgetScope::new("FY2026"));
        let sales = state
            .book
            .insert_sheet(BudgetControlSheet::new("Sales", scope))
            .unwrap();
        let ops = state
            .book
            .insert_sheet(BudgetControlSheet::new("Operations", scope))
            .unwrap();
        let other = state
            .book
            .insert_sheet(BudgetControlSheet::new("R&D", scope))
            .unwrap();
        let source = state
            .book
            .insert_line(BudgetLine::new(Some(sales), dec!(100)))
            .unwrap();
        let target = state
            .book
            .insert_line(BudgetLine::new(Some(ops), dec!(20)))
            .unwrap();
        let bystander = state
            .book
            .insert_line(BudgetLine::new(Some(other), dec!(5)))
            .unwrap();
        for line in [source, target, bystander] {
            state.bump_line(line);
        }

        let mut batch = BudgetTransfer::new("Move", scope).unwrap();
        batch
            .add_item(
                TransferItem::new(sales, ops).with_lines(source, target, dec!(30)),
                &state.book,
            )
            .unwrap();
        Fixture {
            state,
            batch,
            source,
            target,
            bystander,
        }
    }

    #[test]
    fn test_snapshot_only_copies_reachable_lines() {
        let f = fixture();
        let staged = StagedLedger::snapshot(&f.state, &f.batch).unwrap();
        assert!(staged.amount(f.source).is_ok());
        assert!(staged.amount(f.target).is_ok());
        assert!(matches!(
            staged.amount(f.bystander),
            Err(BudgetError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_apply_writes_dirty_lines_and_bumps_versions() {
        let mut f = fixture();
        let mut staged = StagedLedger::snapshot(&f.state, &f.batch).unwrap();
        staged.adjust_amount(f.source, dec!(-30)).unwrap();
        staged.adjust_amount(f.target, dec!(30)).unwrap();
        assert_eq!(staged.dirty().len(), 2);
        assert!(staged.is_current(&f.state));

        staged.apply(&mut f.state).unwrap();
        assert_eq!(f.state.book.amount(f.source).unwrap(), dec!(70));
        assert_eq!(f.state.book.amount(f.target).unwrap(), dec!(50));
        assert_eq!(f.state.line_version(f.source), 2);
        assert_eq!(f.state.line_version(f.bystander), 1);
    }

    #[test]
    fn test_concurrent_write_makes_snapshot_stale() {
        let mut f = fixture();
        let staged = StagedLedger::snapshot(&f.state, &f.batch).unwrap();

        f.state.book.set_amount(f.source, dec!(10)).unwrap();
        f.state.bump_line(f.source);

        assert!(!staged.is_current(&f.state));
    }

    #[test]
    fn test_unrelated_write_keeps_snapshot_current() {
        let mut f = fixture();
        let staged = StagedLedger::snapshot(&f.state, &f.batch).unwrap();

        f.state.book.set_amount(f.bystander, dec!(0)).unwrap();
        f.state.bump_line(f.bystander);

        assert!(staged.is_current(&f.state));
    }

    #[test]
    fn test_structure_change_makes_snapshot_stale() {
        let mut f = fixture();
        let staged = StagedLedger::snapshot(&f.state, &f.batch).unwrap();
        f.state.structure_version += 1;
        assert!(!staged.is_current(&f.state));
    }
}
