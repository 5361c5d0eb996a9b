//! Budget error types.

use budgetctl_shared::types::{BudgetControlId, BudgetLineId, BudgetScopeId, TransferId};
use thiserror::Error;

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Budget scope not found.
    #[error("Budget scope not found: {0}")]
    ScopeNotFound(BudgetScopeId),

    /// Budget control sheet not found.
    #[error("Budget control sheet not found: {0}")]
    SheetNotFound(BudgetControlId),

    /// Budget line not found.
    #[error("Budget line not found: {0}")]
    LineNotFound(BudgetLineId),

    /// Budget line is referenced by a transfer and cannot be removed.
    #[error("Budget line {line} is referenced by transfer {transfer}")]
    LineInUse {
        /// The line that was asked to be removed.
        line: BudgetLineId,
        /// A transfer that still references it.
        transfer: TransferId,
    },

    /// Underlying storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BudgetError {
    /// Returns the HTTP-style status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ScopeNotFound(_) | Self::SheetNotFound(_) | Self::LineNotFound(_) => 404,
            Self::LineInUse { .. } => 409,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for machine-readable output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ScopeNotFound(_) => "SCOPE_NOT_FOUND",
            Self::SheetNotFound(_) => "SHEET_NOT_FOUND",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::LineInUse { .. } => "LINE_IN_USE",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors() {
        let err = BudgetError::LineNotFound(BudgetLineId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "LINE_NOT_FOUND");

        let err = BudgetError::SheetNotFound(BudgetControlId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "SHEET_NOT_FOUND");
    }

    #[test]
    fn test_line_in_use_error() {
        let err = BudgetError::LineInUse {
            line: BudgetLineId::new(),
            transfer: TransferId::new(),
        };
        assert_eq!(err.status_code(), 409);
        assert!(err.to_string().contains("referenced by transfer"));
    }
}
