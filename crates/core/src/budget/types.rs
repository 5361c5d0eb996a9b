//! Budget data types.

use budgetctl_shared::types::{BudgetControlId, BudgetLineId, BudgetScopeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A budget scope, typically one budget year.
///
/// Transfers and control sheets both point at a scope; a transfer may only
/// move allocation between sheets of its own scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetScope {
    /// Scope ID.
    pub id: BudgetScopeId,
    /// Display name (e.g. "FY2026").
    pub name: String,
}

impl BudgetScope {
    /// Creates a new scope with a fresh ID.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BudgetScopeId::new(),
            name: name.into(),
        }
    }
}

/// A budget control sheet grouping budget lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetControlSheet {
    /// Sheet ID.
    pub id: BudgetControlId,
    /// Display name.
    pub name: String,
    /// The budget scope this sheet belongs to.
    pub scope_id: BudgetScopeId,
    /// Whether the sheet is active.
    pub active: bool,
}

impl BudgetControlSheet {
    /// Creates a new active sheet under `scope_id`.
    #[must_use]
    pub fn new(name: impl Into<String>, scope_id: BudgetScopeId) -> Self {
        Self {
            id: BudgetControlId::new(),
            name: name.into(),
            scope_id,
            active: true,
        }
    }
}

/// A single allocation amount.
///
/// A line has no activity flag of its own; see [`BudgetLine::is_active`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Line ID.
    pub id: BudgetLineId,
    /// Owning control sheet, if any.
    pub sheet_id: Option<BudgetControlId>,
    /// Optional label (account or analytic name).
    #[serde(default)]
    pub name: Option<String>,
    /// Allocated amount. Signed.
    pub amount: Decimal,
}

impl BudgetLine {
    /// Creates a new line owned by `sheet_id`.
    #[must_use]
    pub fn new(sheet_id: Option<BudgetControlId>, amount: Decimal) -> Self {
        Self {
            id: BudgetLineId::new(),
            sheet_id,
            name: None,
            amount,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Derived activity: `true` without an owning sheet, otherwise the
    /// sheet's flag.
    ///
    /// `sheet` must be the line's owning sheet as currently stored. The value
    /// is recomputed on each call and never cached.
    #[must_use]
    pub fn is_active(&self, sheet: Option<&BudgetControlSheet>) -> bool {
        match (self.sheet_id, sheet) {
            (None, _) => true,
            (Some(_), Some(sheet)) => sheet.active,
            (Some(_), None) => false,
        }
    }
}
