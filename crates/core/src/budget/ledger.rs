//! Capability interface transfers use to read and mutate budget data.

use budgetctl_shared::types::{BudgetControlId, BudgetLineId};
use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::BudgetControlSheet;

/// Read/write access to budget lines and their control sheets.
///
/// Implementors decide where the data lives. The transfer state machine
/// only needs live amounts, line ownership and sheet lookups.
pub trait BudgetLedger {
    /// Current amount of a line.
    fn amount(&self, line: BudgetLineId) -> Result<Decimal, BudgetError>;

    /// Overwrites the amount of a line.
    fn set_amount(&mut self, line: BudgetLineId, amount: Decimal) -> Result<(), BudgetError>;

    /// Owning sheet of a line.
    fn sheet_of(&self, line: BudgetLineId) -> Result<Option<BudgetControlId>, BudgetError>;

    /// Looks up a control sheet.
    fn sheet(&self, id: BudgetControlId) -> Result<&BudgetControlSheet, BudgetError>;

    /// All lines owned by a sheet.
    fn lines_of_sheet(&self, sheet: BudgetControlId) -> Result<Vec<BudgetLineId>, BudgetError>;

    /// Adds `delta` to a line and returns the new amount.
    fn adjust_amount(&mut self, line: BudgetLineId, delta: Decimal) -> Result<Decimal, BudgetError> {
        let amount = self.amount(line)? + delta;
        self.set_amount(line, amount)?;
        Ok(amount)
    }

    /// Derived activity flag of a line, read through its sheet.
    fn is_line_active(&self, line: BudgetLineId) -> Result<bool, BudgetError> {
        match self.sheet_of(line)? {
            None => Ok(true),
            Some(sheet) => Ok(self.sheet(sheet)?.active),
        }
    }
}
