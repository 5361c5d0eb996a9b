//! Batch-level transfer, reverse and cancel.
//!
//! A batch operation cascades to every item in order, then runs the
//! configured [`BudgetCheck`] over the union of touched sheets, then moves
//! the batch to its new state.
//!
//! What happens when an item in the middle fails depends on [`BatchMode`]:
//! - `Literal`: earlier items stay applied and the batch state is unchanged.
//!   The caller must supply its own transaction boundary.
//! - `Atomic`: every line amount and item state is restored through a
//!   [`Journal`] before the error is returned.

use std::collections::BTreeSet;
use std::sync::Arc;

use budgetctl_shared::types::BudgetControlId;
use budgetctl_shared::{BatchMode, TransferConfig};

use crate::budget::BudgetLedger;
use crate::transfer::batch::BudgetTransfer;
use crate::transfer::check::{BudgetCheck, budget_check};
use crate::transfer::error::TransferError;
use crate::transfer::journal::Journal;
use crate::transfer::types::TransferState;

/// Result of a successful batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// The batch's new state.
    pub state: TransferState,
    /// Number of items applied.
    pub items: usize,
    /// Sheets passed to the balance check.
    pub touched_sheets: BTreeSet<BudgetControlId>,
}

/// Runs batch operations under one failure policy and one balance check.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    mode: BatchMode,
    check: Arc<dyn BudgetCheck>,
    restrict_cancel_to_draft: bool,
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::from_config(&TransferConfig::default())
    }
}

impl TransferEngine {
    /// Creates an engine with an explicit mode and check.
    #[must_use]
    pub fn new(mode: BatchMode, check: Arc<dyn BudgetCheck>) -> Self {
        Self {
            mode,
            check,
            restrict_cancel_to_draft: false,
        }
    }

    /// Creates an engine from configuration.
    #[must_use]
    pub fn from_config(config: &TransferConfig) -> Self {
        Self {
            mode: config.mode,
            check: budget_check(config.balance_check),
            restrict_cancel_to_draft: config.restrict_cancel_to_draft,
        }
    }

    /// Only allow `cancel` on draft batches.
    #[must_use]
    pub fn restrict_cancel_to_draft(mut self, restrict: bool) -> Self {
        self.restrict_cancel_to_draft = restrict;
        self
    }

    /// The failure policy in use.
    #[must_use]
    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Commits every item, checks the touched sheets, and moves the batch
    /// to `transfer`.
    ///
    /// In atomic mode the batch must be a draft.
    pub fn transfer<L: BudgetLedger>(
        &self,
        batch: &mut BudgetTransfer,
        ledger: &mut L,
    ) -> Result<TransferOutcome, TransferError> {
        self.run(batch, ledger, Direction::Transfer)
    }

    /// Rolls back every item, checks the touched sheets, and moves the batch
    /// to `reverse`.
    ///
    /// In atomic mode the batch must be in `transfer`.
    pub fn reverse<L: BudgetLedger>(
        &self,
        batch: &mut BudgetTransfer,
        ledger: &mut L,
    ) -> Result<TransferOutcome, TransferError> {
        self.run(batch, ledger, Direction::Reverse)
    }

    /// Moves the batch to `cancel` without touching items or lines.
    ///
    /// Unguarded unless the engine restricts cancel to drafts.
    pub fn cancel(&self, batch: &mut BudgetTransfer) -> Result<(), TransferError> {
        if self.restrict_cancel_to_draft && batch.state != TransferState::Draft {
            return Err(TransferError::InvalidBatchState {
                transfer: batch.id,
                state: batch.state,
                expected: TransferState::Draft,
            });
        }
        batch.state = TransferState::Cancel;
        Ok(())
    }

    fn run<L: BudgetLedger>(
        &self,
        batch: &mut BudgetTransfer,
        ledger: &mut L,
        direction: Direction,
    ) -> Result<TransferOutcome, TransferError> {
        match self.mode {
            BatchMode::Literal => {
                let mut journal = Journal::new(ledger);
                self.apply_all(batch, &mut journal, direction)
            }
            BatchMode::Atomic => {
                let from = direction.required_state();
                if batch.state != from {
                    return Err(TransferError::InvalidBatchState {
                        transfer: batch.id,
                        state: batch.state,
                        expected: from,
                    });
                }
                let saved = batch.items.clone();
                let mut journal = Journal::new(ledger);
                match self.apply_all(batch, &mut journal, direction) {
                    Ok(outcome) => Ok(outcome),
                    Err(err) => {
                        journal.undo()?;
                        batch.items = saved;
                        Err(err)
                    }
                }
            }
        }
    }

    fn apply_all<L: BudgetLedger>(
        &self,
        batch: &mut BudgetTransfer,
        journal: &mut Journal<'_, L>,
        direction: Direction,
    ) -> Result<TransferOutcome, TransferError> {
        for item in &mut batch.items {
            match direction {
                Direction::Transfer => item.commit(journal)?,
                Direction::Reverse => item.rollback(journal)?,
            }
        }
        let touched_sheets = batch.touched_sheets();
        self.check.check(&touched_sheets, &*journal)?;
        let state = direction.target_state();
        batch.state = state;
        Ok(TransferOutcome {
            state,
            items: batch.items.len(),
            touched_sheets,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Transfer,
    Reverse,
}

impl Direction {
    fn required_state(self) -> TransferState {
        match self {
            Self::Transfer => TransferState::Draft,
            Self::Reverse => TransferState::Transfer,
        }
    }

    fn target_state(self) -> TransferState {
        match self {
            Self::Transfer => TransferState::Transfer,
            Self::Reverse => TransferState::Reverse,
        }
    }
}
