//! Owned, in-memory collection of scopes, sheets and lines.

use std::collections::{BTreeMap, BTreeSet};

use budgetctl_shared::types::{BudgetControlId, BudgetLineId, BudgetScopeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::BudgetError;
use super::ledger::BudgetLedger;
use super::types::{BudgetControlSheet, BudgetLine, BudgetScope};

/// Scopes, control sheets and budget lines keyed by ID.
///
/// Inserts check references: a sheet needs its scope, a line needs its
/// sheet. Maps are ordered so iteration and serialized output are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetBook {
    #[serde(default)]
    scopes: BTreeMap<BudgetScopeId, BudgetScope>,
    #[serde(default)]
    sheets: BTreeMap<BudgetControlId, BudgetControlSheet>,
    #[serde(default)]
    lines: BTreeMap<BudgetLineId, BudgetLine>,
}

impl BudgetBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a scope.
    pub fn insert_scope(&mut self, scope: BudgetScope) -> BudgetScopeId {
        let id = scope.id;
        self.scopes.insert(id, scope);
        id
    }

    /// Adds or replaces a sheet.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::ScopeNotFound` if the sheet's scope is unknown.
    pub fn insert_sheet(&mut self, sheet: BudgetControlSheet) -> Result<BudgetControlId, BudgetError> {
        if !self.scopes.contains_key(&sheet.scope_id) {
            return Err(BudgetError::ScopeNotFound(sheet.scope_id));
        }
        let id = sheet.id;
        self.sheets.insert(id, sheet);
        Ok(id)
    }

    /// Adds or replaces a line.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::SheetNotFound` if the owning sheet is unknown.
    pub fn insert_line(&mut self, line: BudgetLine) -> Result<BudgetLineId, BudgetError> {
        if let Some(sheet) = line.sheet_id {
            if !self.sheets.contains_key(&sheet) {
                return Err(BudgetError::SheetNotFound(sheet));
            }
        }
        let id = line.id;
        self.lines.insert(id, line);
        Ok(id)
    }

    /// Checks the references the inserts enforce, for books built some other
    /// way, e.g. deserialized from a file.
    ///
    /// # Errors
    ///
    /// `ScopeNotFound` for a sheet whose scope is unknown, `SheetNotFound`
    /// for a line whose sheet is unknown.
    pub fn validate(&self) -> Result<(), BudgetError> {
        for sheet in self.sheets.values() {
            if !self.scopes.contains_key(&sheet.scope_id) {
                return Err(BudgetError::ScopeNotFound(sheet.scope_id));
            }
        }
        for sheet in self.lines.values().filter_map(|line| line.sheet_id) {
            if !self.sheets.contains_key(&sheet) {
                return Err(BudgetError::SheetNotFound(sheet));
            }
        }
        Ok(())
    }

    /// Removes a line and returns it.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::LineNotFound` if the line is unknown.
    pub fn remove_line(&mut self, id: BudgetLineId) -> Result<BudgetLine, BudgetError> {
        self.lines.remove(&id).ok_or(BudgetError::LineNotFound(id))
    }

    /// Looks up a scope.
    pub fn scope(&self, id: BudgetScopeId) -> Result<&BudgetScope, BudgetError> {
        self.scopes.get(&id).ok_or(BudgetError::ScopeNotFound(id))
    }

    /// Looks up a line.
    pub fn line(&self, id: BudgetLineId) -> Result<&BudgetLine, BudgetError> {
        self.lines.get(&id).ok_or(BudgetError::LineNotFound(id))
    }

    /// Mutable access to a sheet.
    pub fn sheet_mut(&mut self, id: BudgetControlId) -> Result<&mut BudgetControlSheet, BudgetError> {
        self.sheets.get_mut(&id).ok_or(BudgetError::SheetNotFound(id))
    }

    /// Iterates all scopes.
    pub fn scopes(&self) -> impl Iterator<Item = &BudgetScope> {
        self.scopes.values()
    }

    /// Iterates all lines.
    pub fn lines(&self) -> impl Iterator<Item = &BudgetLine> {
        self.lines.values()
    }

    /// Sheets that belong to `scope`.
    pub fn sheets_in_scope(&self, scope: BudgetScopeId) -> Vec<&BudgetControlSheet> {
        self.sheets
            .values()
            .filter(|sheet| sheet.scope_id == scope)
            .collect()
    }

    /// Sum of every line amount.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.values().map(|line| line.amount).sum()
    }

    /// Copies the given sheets, every line they own, and the scopes they
    /// reference into a new book. Unknown sheet IDs are skipped.
    #[must_use]
    pub fn subset(&self, sheets: &BTreeSet<BudgetControlId>) -> Self {
        let mut out = Self::new();
        for sheet in sheets.iter().filter_map(|id| self.sheets.get(id)) {
            if let Some(scope) = self.scopes.get(&sheet.scope_id) {
                out.scopes.insert(scope.id, scope.clone());
            }
            out.sheets.insert(sheet.id, sheet.clone());
        }
        for line in self.lines.values() {
            if line.sheet_id.is_some_and(|sheet| sheets.contains(&sheet)) {
                out.lines.insert(line.id, line.clone());
            }
        }
        out
    }
}

impl BudgetLedger for BudgetBook {
    fn amount(&self, line: BudgetLineId) -> Result<Decimal, BudgetError> {
        Ok(self.line(line)?.amount)
    }

    fn set_amount(&mut self, line: BudgetLineId, amount: Decimal) -> Result<(), BudgetError> {
        let entry = self
            .lines
            .get_mut(&line)
            .ok_or(BudgetError::LineNotFound(line))?;
        entry.amount = amount;
        Ok(())
    }

    fn sheet_of(&self, line: BudgetLineId) -> Result<Option<BudgetControlId>, BudgetError> {
        Ok(self.line(line)?.sheet_id)
    }

    fn sheet(&self, id: BudgetControlId) -> Result<&BudgetControlSheet, BudgetError> {
        self.sheets.get(&id).ok_or(BudgetError::SheetNotFound(id))
    }

    fn lines_of_sheet(&self, sheet: BudgetControlId) -> Result<Vec<BudgetLineId>, BudgetError> {
        if !self.sheets.contains_key(&sheet) {
            return Err(BudgetError::SheetNotFound(sheet));
        }
        Ok(self
            .lines
            .values()
            .filter(|line| line.sheet_id == Some(sheet))
            .map(|line| line.id)
            .collect())
    }
}
