//! Transfer repository for batch editing and batch operations.
//!
//! Editing happens under the store's write lock. `transfer` and `reverse`
//! run the engine against a [`StagedLedger`] snapshot outside the lock and
//! publish with a version compare-and-swap, retrying on conflict.

use std::sync::Arc;

use budgetctl_core::budget::BudgetBook;
use budgetctl_core::transfer::{
    BudgetTransfer, TransferEngine, TransferError, TransferItem, TransferOutcome,
};
use budgetctl_shared::types::{
    BudgetControlId, BudgetLineId, BudgetScopeId, TransferId, TransferItemId,
};
use budgetctl_shared::{BatchMode, TransferConfig};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::staging::StagedLedger;
use crate::store::{MemoryStore, Versioned};

/// Transfer repository backed by a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct TransferRepository {
    store: Arc<MemoryStore>,
    engine: TransferEngine,
    max_conflict_retries: u32,
}

impl TransferRepository {
    /// Creates a repository using the engine and retry policy from `config`.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, config: &TransferConfig) -> Self {
        Self {
            store,
            engine: TransferEngine::from_config(config),
            max_conflict_retries: config.max_conflict_retries,
        }
    }

    /// Creates an empty draft batch in `scope_id`.
    pub fn create(
        &self,
        name: impl Into<String>,
        scope_id: BudgetScopeId,
    ) -> Result<BudgetTransfer, TransferError> {
        let batch = BudgetTransfer::new(name, scope_id)?;
        let mut state = self.store.write()?;
        state.book.scope(scope_id)?;
        state
            .transfers
            .insert(batch.id, Versioned::new(batch.clone()));
        info!(transfer_id = %batch.id, %scope_id, name = %batch.name, "Transfer created");
        Ok(batch)
    }

    /// Looks up a batch.
    pub fn get(&self, id: TransferId) -> Result<BudgetTransfer, TransferError> {
        let state = self.store.read()?;
        state
            .transfers
            .get(&id)
            .map(|entry| entry.value.clone())
            .ok_or(TransferError::TransferNotFound(id))
    }

    /// Every batch, ordered by ID.
    pub fn list(&self) -> Result<Vec<BudgetTransfer>, TransferError> {
        let state = self.store.read()?;
        Ok(state
            .transfers
            .values()
            .map(|entry| entry.value.clone())
            .collect())
    }

    /// Deletes a batch and its items. Only allowed while nothing has been
    /// applied.
    pub fn delete(&self, id: TransferId) -> Result<(), TransferError> {
        let mut state = self.store.write()?;
        let entry = state
            .transfers
            .get(&id)
            .ok_or(TransferError::TransferNotFound(id))?;
        if !entry.value.is_deletable() {
            return Err(TransferError::BatchNotEditable {
                transfer: id,
                state: entry.value.state,
            });
        }
        state.transfers.remove(&id);
        info!(transfer_id = %id, "Transfer deleted");
        Ok(())
    }

    /// Adds a draft item to a batch.
    pub fn add_item(&self, id: TransferId, item: TransferItem) -> Result<TransferItemId, TransferError> {
        self.edit(id, |batch, book| batch.add_item(item, book))
    }

    /// Removes an item from a draft batch.
    pub fn remove_item(&self, id: TransferId, item: TransferItemId) -> Result<TransferItem, TransferError> {
        self.edit(id, |batch, _| batch.remove_item(item))
    }

    /// Changes an item's source sheet and clears its source line.
    pub fn set_source_control(
        &self,
        id: TransferId,
        item: TransferItemId,
        sheet: BudgetControlId,
    ) -> Result<(), TransferError> {
        self.edit(id, |batch, book| batch.set_source_control(item, sheet, book))
    }

    /// Changes an item's target sheet and clears its target line.
    pub fn set_target_control(
        &self,
        id: TransferId,
        item: TransferItemId,
        sheet: BudgetControlId,
    ) -> Result<(), TransferError> {
        self.edit(id, |batch, book| batch.set_target_control(item, sheet, book))
    }

    /// Selects an item's source line.
    pub fn set_source_line(
        &self,
        id: TransferId,
        item: TransferItemId,
        line: BudgetLineId,
    ) -> Result<(), TransferError> {
        self.edit(id, |batch, book| batch.set_source_line(item, line, book))
    }

    /// Selects an item's target line.
    pub fn set_target_line(
        &self,
        id: TransferId,
        item: TransferItemId,
        line: BudgetLineId,
    ) -> Result<(), TransferError> {
        self.edit(id, |batch, book| batch.set_target_line(item, line, book))
    }

    /// Changes the amount an item moves.
    pub fn set_item_amount(
        &self,
        id: TransferId,
        item: TransferItemId,
        amount: Decimal,
    ) -> Result<(), TransferError> {
        self.edit(id, |batch, _| batch.set_item_amount(item, amount))
    }

    /// Transfers every item of a batch.
    pub fn transfer(&self, id: TransferId) -> Result<TransferOutcome, TransferError> {
        self.run(id, BatchOp::Transfer)
    }

    /// Reverses every item of a batch.
    pub fn reverse(&self, id: TransferId) -> Result<TransferOutcome, TransferError> {
        self.run(id, BatchOp::Reverse)
    }

    /// Cancels a batch without touching its items or lines.
    pub fn cancel(&self, id: TransferId) -> Result<(), TransferError> {
        self.edit(id, |batch, _| self.engine.cancel(batch))?;
        info!(transfer_id = %id, "Transfer cancelled");
        Ok(())
    }

    /// Applies `change` to a copy of the batch under the write lock and
    /// stores the copy only if `change` succeeds.
    fn edit<T>(
        &self,
        id: TransferId,
        change: impl FnOnce(&mut BudgetTransfer, &BudgetBook) -> Result<T, TransferError>,
    ) -> Result<T, TransferError> {
        let mut guard = self.store.write()?;
        let state = &mut *guard;
        let entry = state
            .transfers
            .get_mut(&id)
            .ok_or(TransferError::TransferNotFound(id))?;
        let mut batch = entry.value.clone();
        let out = change(&mut batch, &state.book)?;
        entry.replace(batch);
        Ok(out)
    }

    fn run(&self, id: TransferId, op: BatchOp) -> Result<TransferOutcome, TransferError> {
        for attempt in 0..=self.max_conflict_retries {
            let (mut batch, batch_version, mut staged) = {
                let state = self.store.read()?;
                let entry = state
                    .transfers
                    .get(&id)
                    .ok_or(TransferError::TransferNotFound(id))?;
                let staged = StagedLedger::snapshot(&state, &entry.value)?;
                (entry.value.clone(), entry.version, staged)
            };

            let result = match op {
                BatchOp::Transfer => self.engine.transfer(&mut batch, &mut staged),
                BatchOp::Reverse => self.engine.reverse(&mut batch, &mut staged),
            };

            let mut state = self.store.write()?;
            let version = state.transfers.get(&id).map(|entry| entry.version);
            if version != Some(batch_version) || !staged.is_current(&state) {
                drop(state);
                warn!(transfer_id = %id, op = op.name(), attempt, "Concurrent modification, retrying");
                continue;
            }

            // A failed atomic run has already undone its staged writes.
            let publish = result.is_ok() || self.engine.mode() == BatchMode::Literal;
            if publish {
                let lines_written = staged.dirty().len();
                staged.apply(&mut state)?;
                if let Some(entry) = state.transfers.get_mut(&id) {
                    entry.replace(batch);
                }
                debug!(transfer_id = %id, lines_written, "Staged writes published");
            }

            match &result {
                Ok(outcome) => info!(
                    transfer_id = %id,
                    op = op.name(),
                    state = %outcome.state,
                    items = outcome.items,
                    sheets = outcome.touched_sheets.len(),
                    "Transfer batch applied"
                ),
                Err(err) => warn!(
                    transfer_id = %id,
                    op = op.name(),
                    error = %err,
                    partial = publish,
                    "Transfer batch failed"
                ),
            }
            return result;
        }

        warn!(transfer_id = %id, op = op.name(), retries = self.max_conflict_retries, "Giving up after repeated conflicts");
        Err(TransferError::ConcurrentModification(id))
    }
}

#[derive(Debug, Clone, Copy)]
enum BatchOp {
    Transfer,
    Reverse,
}

impl BatchOp {
    fn name(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Reverse => "reverse",
        }
    }
}
