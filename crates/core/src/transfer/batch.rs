//! The transfer batch aggregate and its draft-time editing rules.

use std::collections::BTreeSet;

use budgetctl_shared::types::{BudgetControlId, BudgetLineId, BudgetScopeId, TransferId, TransferItemId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::BudgetLedger;
use crate::transfer::error::TransferError;
use crate::transfer::item::TransferItem;
use crate::transfer::types::{ItemState, TransferState};

/// One user-initiated transfer operation: an ordered set of items that are
/// transferred or reversed together.
///
/// Items can only be added, removed or edited while the batch is a draft.
/// Every sheet an item names must belong to the batch's scope, and every
/// line must belong to the sheet it is selected under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetTransfer {
    /// Batch ID.
    pub id: TransferId,
    /// Display name.
    pub name: String,
    /// Budget scope all sheets must belong to.
    pub scope_id: BudgetScopeId,
    /// Items, applied in order.
    #[serde(default)]
    pub items: Vec<TransferItem>,
    /// Current state.
    #[serde(default)]
    pub state: TransferState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BudgetTransfer {
    /// Creates an empty draft batch.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::NameRequired` if `name` is blank.
    pub fn new(name: impl Into<String>, scope_id: BudgetScopeId) -> Result<Self, TransferError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TransferError::NameRequired);
        }
        Ok(Self {
            id: TransferId::new(),
            name,
            scope_id,
            items: Vec::new(),
            state: TransferState::Draft,
            created_at: Utc::now(),
        })
    }

    /// Adds a draft item after validating its sheets and any selected lines.
    pub fn add_item<L: BudgetLedger + ?Sized>(
        &mut self,
        item: TransferItem,
        ledger: &L,
    ) -> Result<TransferItemId, TransferError> {
        self.ensure_editable()?;
        if item.state != ItemState::Draft {
            return Err(TransferError::InvalidState {
                item: item.id,
                state: item.state,
                expected: ItemState::Draft,
            });
        }
        self.check_scope(item.source_control_id, ledger)?;
        self.check_scope(item.target_control_id, ledger)?;
        if let Some(line) = item.source_line_id {
            check_line_in_sheet(line, item.source_control_id, ledger)?;
        }
        if let Some(line) = item.target_line_id {
            check_line_in_sheet(line, item.target_control_id, ledger)?;
        }
        let id = item.id;
        self.items.push(item);
        Ok(id)
    }

    /// Removes an item. Only drafts can lose items.
    pub fn remove_item(&mut self, id: TransferItemId) -> Result<TransferItem, TransferError> {
        self.ensure_editable()?;
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(TransferError::ItemNotFound(id))?;
        Ok(self.items.remove(index))
    }

    /// Looks up an item.
    pub fn item(&self, id: TransferItemId) -> Result<&TransferItem, TransferError> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or(TransferError::ItemNotFound(id))
    }

    /// Points an item at a different source sheet and clears its source line.
    pub fn set_source_control<L: BudgetLedger + ?Sized>(
        &mut self,
        id: TransferItemId,
        sheet: BudgetControlId,
        ledger: &L,
    ) -> Result<(), TransferError> {
        self.check_scope(sheet, ledger)?;
        self.item_mut(id)?.set_source_control(sheet);
        Ok(())
    }

    /// Points an item at a different target sheet and clears its target line.
    pub fn set_target_control<L: BudgetLedger + ?Sized>(
        &mut self,
        id: TransferItemId,
        sheet: BudgetControlId,
        ledger: &L,
    ) -> Result<(), TransferError> {
        self.check_scope(sheet, ledger)?;
        self.item_mut(id)?.set_target_control(sheet);
        Ok(())
    }

    /// Selects the source line; it must belong to the item's source sheet.
    pub fn set_source_line<L: BudgetLedger + ?Sized>(
        &mut self,
        id: TransferItemId,
        line: BudgetLineId,
        ledger: &L,
    ) -> Result<(), TransferError> {
        let item = self.item_mut(id)?;
        check_line_in_sheet(line, item.source_control_id, ledger)?;
        item.source_line_id = Some(line);
        Ok(())
    }

    /// Selects the target line; it must belong to the item's target sheet.
    pub fn set_target_line<L: BudgetLedger + ?Sized>(
        &mut self,
        id: TransferItemId,
        line: BudgetLineId,
        ledger: &L,
    ) -> Result<(), TransferError> {
        let item = self.item_mut(id)?;
        check_line_in_sheet(line, item.target_control_id, ledger)?;
        item.target_line_id = Some(line);
        Ok(())
    }

    /// Changes the amount an item moves.
    pub fn set_item_amount(&mut self, id: TransferItemId, amount: Decimal) -> Result<(), TransferError> {
        self.item_mut(id)?.amount = amount;
        Ok(())
    }

    /// Union of every item's source and target sheet.
    #[must_use]
    pub fn touched_sheets(&self) -> BTreeSet<BudgetControlId> {
        self.items
            .iter()
            .flat_map(|item| [item.source_control_id, item.target_control_id])
            .collect()
    }

    /// Every line any item selects.
    #[must_use]
    pub fn referenced_lines(&self) -> BTreeSet<BudgetLineId> {
        self.items
            .iter()
            .flat_map(|item| [item.source_line_id, item.target_line_id])
            .flatten()
            .collect()
    }

    /// Whether any item selects `line`.
    #[must_use]
    pub fn references_line(&self, line: BudgetLineId) -> bool {
        self.items
            .iter()
            .any(|item| item.source_line_id == Some(line) || item.target_line_id == Some(line))
    }

    /// A batch may be deleted (with its items) only while no item has been
    /// applied.
    #[must_use]
    pub fn is_deletable(&self) -> bool {
        matches!(self.state, TransferState::Draft | TransferState::Cancel)
            && self.items.iter().all(|item| item.state == ItemState::Draft)
    }

    fn ensure_editable(&self) -> Result<(), TransferError> {
        if self.state.is_editable() {
            Ok(())
        } else {
            Err(TransferError::BatchNotEditable {
                transfer: self.id,
                state: self.state,
            })
        }
    }

    fn item_mut(&mut self, id: TransferItemId) -> Result<&mut TransferItem, TransferError> {
        self.ensure_editable()?;
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(TransferError::ItemNotFound(id))
    }

    fn check_scope<L: BudgetLedger + ?Sized>(
        &self,
        sheet: BudgetControlId,
        ledger: &L,
    ) -> Result<(), TransferError> {
        if ledger.sheet(sheet)?.scope_id == self.scope_id {
            Ok(())
        } else {
            Err(TransferError::ScopeMismatch {
                sheet,
                expected: self.scope_id,
            })
        }
    }
}

fn check_line_in_sheet<L: BudgetLedger + ?Sized>(
    line: BudgetLineId,
    sheet: BudgetControlId,
    ledger: &L,
) -> Result<(), TransferError> {
    if ledger.sheet_of(line)? == Some(sheet) {
        Ok(())
    } else {
        Err(TransferError::LineNotInSheet { line, sheet })
    }
}
