//! Post-condition checks run after a batch transfer or reverse.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use budgetctl_shared::BalanceCheckKind;
use budgetctl_shared::types::BudgetControlId;
use rust_decimal::Decimal;

use crate::budget::BudgetLedger;
use crate::transfer::error::TransferError;

/// Validates the sheets a batch touched once all its items are applied.
pub trait BudgetCheck: fmt::Debug + Send + Sync {
    /// Runs the check over `sheets`, the union of every item's source and
    /// target sheet.
    fn check(
        &self,
        sheets: &BTreeSet<BudgetControlId>,
        ledger: &dyn BudgetLedger,
    ) -> Result<(), TransferError>;
}

/// Collects nothing and asserts nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBudgetCheck;

impl BudgetCheck for NoopBudgetCheck {
    fn check(
        &self,
        _sheets: &BTreeSet<BudgetControlId>,
        _ledger: &dyn BudgetLedger,
    ) -> Result<(), TransferError> {
        Ok(())
    }
}

/// Fails when any line of a touched sheet is below zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonNegativeBudgetCheck;

impl BudgetCheck for NonNegativeBudgetCheck {
    fn check(
        &self,
        sheets: &BTreeSet<BudgetControlId>,
        ledger: &dyn BudgetLedger,
    ) -> Result<(), TransferError> {
        for &sheet in sheets {
            for line in ledger.lines_of_sheet(sheet)? {
                let amount = ledger.amount(line)?;
                if amount < Decimal::ZERO {
                    return Err(TransferError::NegativeBalance { line, amount });
                }
            }
        }
        Ok(())
    }
}

/// Builds the configured check.
#[must_use]
pub fn budget_check(kind: BalanceCheckKind) -> Arc<dyn BudgetCheck> {
    match kind {
        BalanceCheckKind::Noop => Arc::new(NoopBudgetCheck),
        BalanceCheckKind::NonNegative => Arc::new(NonNegativeBudgetCheck),
    }
}
