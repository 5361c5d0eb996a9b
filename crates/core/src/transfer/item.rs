//! A single source → target reallocation and its state machine.

use budgetctl_shared::types::{BudgetControlId, BudgetLineId, TransferItemId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::BudgetLedger;
use crate::transfer::error::TransferError;
use crate::transfer::types::ItemState;

/// One reallocation request between two budget lines.
///
/// `source_amount` and `target_amount` are not stored; they are read from
/// the ledger each time so they always reflect the lines' current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    /// Item ID.
    pub id: TransferItemId,
    /// Sheet the allocation is taken from.
    pub source_control_id: BudgetControlId,
    /// Sheet the allocation is given to.
    pub target_control_id: BudgetControlId,
    /// Line the allocation is taken from.
    pub source_line_id: Option<BudgetLineId>,
    /// Line the allocation is given to.
    pub target_line_id: Option<BudgetLineId>,
    /// Transfer amount. Signed.
    #[serde(default)]
    pub amount: Decimal,
    /// Current state.
    #[serde(default)]
    pub state: ItemState,
    /// When the item was committed.
    #[serde(default)]
    pub transferred_at: Option<DateTime<Utc>>,
    /// When the item was rolled back.
    #[serde(default)]
    pub reversed_at: Option<DateTime<Utc>>,
}

impl TransferItem {
    /// Creates a draft item between two sheets with no lines selected yet.
    #[must_use]
    pub fn new(source_control_id: BudgetControlId, target_control_id: BudgetControlId) -> Self {
        Self {
            id: TransferItemId::new(),
            source_control_id,
            target_control_id,
            source_line_id: None,
            target_line_id: None,
            amount: Decimal::ZERO,
            state: ItemState::Draft,
            transferred_at: None,
            reversed_at: None,
        }
    }

    /// Selects both lines and the amount in one go.
    #[must_use]
    pub fn with_lines(mut self, source: BudgetLineId, target: BudgetLineId, amount: Decimal) -> Self {
        self.source_line_id = Some(source);
        self.target_line_id = Some(target);
        self.amount = amount;
        self
    }

    /// Changes the source sheet. The previously selected source line no
    /// longer applies and is cleared.
    pub(crate) fn set_source_control(&mut self, sheet: BudgetControlId) {
        self.source_control_id = sheet;
        self.source_line_id = None;
    }

    /// Changes the target sheet and clears the target line.
    pub(crate) fn set_target_control(&mut self, sheet: BudgetControlId) {
        self.target_control_id = sheet;
        self.target_line_id = None;
    }

    /// Both selected lines, or `MissingEndpoint`.
    pub fn endpoints(&self) -> Result<(BudgetLineId, BudgetLineId), TransferError> {
        match (self.source_line_id, self.target_line_id) {
            (Some(source), Some(target)) => Ok((source, target)),
            _ => Err(TransferError::MissingEndpoint(self.id)),
        }
    }

    /// Live amount of the source line.
    pub fn source_amount<L: BudgetLedger + ?Sized>(&self, ledger: &L) -> Result<Decimal, TransferError> {
        let (source, _) = self.endpoints()?;
        Ok(ledger.amount(source)?)
    }

    /// Live amount of the target line.
    pub fn target_amount<L: BudgetLedger + ?Sized>(&self, ledger: &L) -> Result<Decimal, TransferError> {
        let (_, target) = self.endpoints()?;
        Ok(ledger.amount(target)?)
    }

    /// Moves `amount` from the source line to the target line.
    ///
    /// Checks, in order: the item is a draft, the sheets differ, both lines
    /// are selected, the lines differ, each line belongs to its sheet, and
    /// `amount` does not exceed the live source amount. Nothing is mutated
    /// when a check fails.
    ///
    /// # Errors
    ///
    /// `InvalidState`, `SameEndpoint`, `MissingEndpoint`, `LineNotInSheet`,
    /// `InsufficientAmount`, or a ledger error.
    pub fn commit<L: BudgetLedger + ?Sized>(&mut self, ledger: &mut L) -> Result<(), TransferError> {
        self.expect_state(ItemState::Draft)?;
        if self.source_control_id == self.target_control_id {
            return Err(TransferError::SameEndpoint(self.source_control_id));
        }
        let (source, target) = self.endpoints()?;
        if source == target {
            return Err(TransferError::SameEndpoint(self.source_control_id));
        }
        self.check_ownership(&*ledger, source, target)?;
        self.check_available(&*ledger, source)?;

        ledger.adjust_amount(source, -self.amount)?;
        ledger.adjust_amount(target, self.amount)?;
        self.state = ItemState::Transferred;
        self.transferred_at = Some(Utc::now());
        Ok(())
    }

    /// Moves `amount` back from the target line to the source line.
    ///
    /// Mirrors [`commit`](Self::commit) arithmetically; it assumes neither
    /// line changed in between. The amount is re-checked against the live
    /// source amount, i.e. the source as it stands after the original commit.
    ///
    /// # Errors
    ///
    /// `InvalidState`, `MissingEndpoint`, `InsufficientAmount`, or a ledger
    /// error.
    pub fn rollback<L: BudgetLedger + ?Sized>(&mut self, ledger: &mut L) -> Result<(), TransferError> {
        self.expect_state(ItemState::Transferred)?;
        let (source, target) = self.endpoints()?;
        self.check_available(&*ledger, source)?;

        ledger.adjust_amount(source, self.amount)?;
        ledger.adjust_amount(target, -self.amount)?;
        self.state = ItemState::Reversed;
        self.reversed_at = Some(Utc::now());
        Ok(())
    }

    fn expect_state(&self, expected: ItemState) -> Result<(), TransferError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TransferError::InvalidState {
                item: self.id,
                state: self.state,
                expected,
            })
        }
    }

    fn check_ownership<L: BudgetLedger + ?Sized>(
        &self,
        ledger: &L,
        source: BudgetLineId,
        target: BudgetLineId,
    ) -> Result<(), TransferError> {
        for (line, sheet) in [
            (source, self.source_control_id),
            (target, self.target_control_id),
        ] {
            if ledger.sheet_of(line)? != Some(sheet) {
                return Err(TransferError::LineNotInSheet { line, sheet });
            }
        }
        Ok(())
    }

    fn check_available<L: BudgetLedger + ?Sized>(
        &self,
        ledger: &L,
        source: BudgetLineId,
    ) -> Result<(), TransferError> {
        let available = ledger.amount(source)?;
        if self.amount > available {
            return Err(TransferError::InsufficientAmount {
                requested: self.amount,
                available,
            });
        }
        Ok(())
    }
}
