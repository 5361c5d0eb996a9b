//! Budget repository for scopes, control sheets and budget lines.

use std::sync::Arc;

use budgetctl_core::budget::{
    BudgetBook, BudgetControlSheet, BudgetError, BudgetLedger, BudgetLine, BudgetScope,
};
use budgetctl_shared::types::{BudgetControlId, BudgetLineId, BudgetScopeId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::store::MemoryStore;

/// Input for creating a budget line.
#[derive(Debug, Clone)]
pub struct CreateLineInput {
    /// Owning control sheet, if any.
    pub sheet_id: Option<BudgetControlId>,
    /// Display name.
    pub name: Option<String>,
    /// Starting amount.
    pub amount: Decimal,
}

/// A budget line with its activity flag resolved through its sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLineView {
    /// The stored line.
    #[serde(flatten)]
    pub line: BudgetLine,
    /// Derived activity flag.
    pub active: bool,
}

/// Budget repository backed by a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    store: Arc<MemoryStore>,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Creates a budget scope.
    pub fn create_scope(&self, name: impl Into<String>) -> Result<BudgetScope, BudgetError> {
        let scope = BudgetScope::new(name);
        let mut state = self.store.write()?;
        state.book.insert_scope(scope.clone());
        info!(scope_id = %scope.id, name = %scope.name, "Budget scope created");
        Ok(scope)
    }

    /// Creates an active control sheet in `scope_id`.
    pub fn create_sheet(
        &self,
        name: impl Into<String>,
        scope_id: BudgetScopeId,
    ) -> Result<BudgetControlSheet, BudgetError> {
        let sheet = BudgetControlSheet::new(name, scope_id);
        let mut state = self.store.write()?;
        state.book.insert_sheet(sheet.clone())?;
        info!(sheet_id = %sheet.id, %scope_id, name = %sheet.name, "Budget control sheet created");
        Ok(sheet)
    }

    /// Creates a budget line.
    pub fn create_line(&self, input: CreateLineInput) -> Result<BudgetLine, BudgetError> {
        let mut line = BudgetLine::new(input.sheet_id, input.amount);
        if let Some(name) = input.name {
            line = line.with_name(name);
        }
        let mut state = self.store.write()?;
        state.book.insert_line(line.clone())?;
        state.bump_line(line.id);
        state.structure_version += 1;
        info!(line_id = %line.id, amount = %line.amount, "Budget line created");
        Ok(line)
    }

    /// Looks up a line with its derived activity flag.
    pub fn get_line(&self, id: BudgetLineId) -> Result<BudgetLineView, BudgetError> {
        let state = self.store.read()?;
        view(&state.book, id)
    }

    /// Looks up a control sheet.
    pub fn get_sheet(&self, id: BudgetControlId) -> Result<BudgetControlSheet, BudgetError> {
        let state = self.store.read()?;
        state.book.sheet(id).cloned()
    }

    /// Activates or deactivates a control sheet. Lines follow on their next
    /// read.
    pub fn set_sheet_active(&self, id: BudgetControlId, active: bool) -> Result<(), BudgetError> {
        let mut state = self.store.write()?;
        state.book.sheet_mut(id)?.active = active;
        state.structure_version += 1;
        info!(sheet_id = %id, active, "Budget control sheet activity changed");
        Ok(())
    }

    /// All control sheets of a scope.
    pub fn sheets_in_scope(&self, scope: BudgetScopeId) -> Result<Vec<BudgetControlSheet>, BudgetError> {
        let state = self.store.read()?;
        state.book.scope(scope)?;
        Ok(state
            .book
            .sheets_in_scope(scope)
            .into_iter()
            .cloned()
            .collect())
    }

    /// All lines owned by a sheet.
    pub fn lines_of_sheet(&self, sheet: BudgetControlId) -> Result<Vec<BudgetLineView>, BudgetError> {
        let state = self.store.read()?;
        state
            .book
            .lines_of_sheet(sheet)?
            .into_iter()
            .map(|line| view(&state.book, line))
            .collect()
    }

    /// Overwrites a line amount from outside the transfer workflow, such as
    /// a recompute from actuals. Batch operations that read the old amount
    /// will retry.
    pub fn set_line_amount(&self, id: BudgetLineId, amount: Decimal) -> Result<(), BudgetError> {
        let mut state = self.store.write()?;
        state.book.set_amount(id, amount)?;
        state.bump_line(id);
        info!(line_id = %id, %amount, "Budget line amount set");
        Ok(())
    }

    /// Removes a line that no transfer references.
    pub fn remove_line(&self, id: BudgetLineId) -> Result<BudgetLine, BudgetError> {
        let mut state = self.store.write()?;
        if let Some(entry) = state
            .transfers
            .values()
            .find(|entry| entry.value.references_line(id))
        {
            return Err(BudgetError::LineInUse {
                line: id,
                transfer: entry.value.id,
            });
        }
        let line = state.book.remove_line(id)?;
        state.line_versions.remove(&id);
        state.structure_version += 1;
        info!(line_id = %id, "Budget line removed");
        Ok(line)
    }

    /// Copy of every scope, sheet and line.
    pub fn book(&self) -> Result<BudgetBook, BudgetError> {
        Ok(self.store.read()?.book.clone())
    }
}

fn view(book: &BudgetBook, id: BudgetLineId) -> Result<BudgetLineView, BudgetError> {
    Ok(BudgetLineView {
        line: book.line(id)?.clone(),
        active: book.is_line_active(id)?,
    })
}
