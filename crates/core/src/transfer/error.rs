//! Transfer error types.
//!
//! Every variant is a validation failure reported synchronously to the
//! caller. Nothing here is retried automatically except
//! `ConcurrentModification`, which repositories retry before surfacing.

use budgetctl_shared::AppError;
use budgetctl_shared::types::{BudgetControlId, BudgetLineId, BudgetScopeId, TransferId, TransferItemId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::budget::BudgetError;
use crate::transfer::types::{ItemState, TransferState};

/// Errors that can occur while editing, transferring or reversing budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Item operation attempted from the wrong state.
    #[error("Invalid state! Item {item} is {state}, expected {expected}")]
    InvalidState {
        /// The item.
        item: TransferItemId,
        /// Its current state.
        state: ItemState,
        /// The state the operation requires.
        expected: ItemState,
    },

    /// Batch operation attempted from the wrong state.
    #[error("Invalid state! Transfer {transfer} is {state}, expected {expected}")]
    InvalidBatchState {
        /// The batch.
        transfer: TransferId,
        /// Its current state.
        state: TransferState,
        /// The state the operation requires.
        expected: TransferState,
    },

    /// Source and target are the same budget control sheet or the same
    /// budget line; carries the source sheet.
    #[error("Cannot transfer from the same budget control sheet {0}")]
    SameEndpoint(BudgetControlId),

    /// Requested amount exceeds the live source amount.
    #[error("Transfer amount {requested} exceeds source amount {available}")]
    InsufficientAmount {
        /// Amount the item moves.
        requested: Decimal,
        /// Live amount of the source line.
        available: Decimal,
    },

    /// Item has no source or target line selected.
    #[error("Transfer item {0} has no source or target budget line")]
    MissingEndpoint(TransferItemId),

    /// Line does not belong to the selected control sheet.
    #[error("Budget line {line} does not belong to budget control sheet {sheet}")]
    LineNotInSheet {
        /// The line.
        line: BudgetLineId,
        /// The sheet it was expected under.
        sheet: BudgetControlId,
    },

    /// Sheet belongs to a different budget scope than the batch.
    #[error("Budget control sheet {sheet} is not in budget scope {expected}")]
    ScopeMismatch {
        /// The sheet.
        sheet: BudgetControlId,
        /// The batch's scope.
        expected: BudgetScopeId,
    },

    /// Batch is past draft and can no longer be edited.
    #[error("Transfer {transfer} is {state} and cannot be modified")]
    BatchNotEditable {
        /// The batch.
        transfer: TransferId,
        /// Its current state.
        state: TransferState,
    },

    /// Batch name is blank.
    #[error("Transfer name is required")]
    NameRequired,

    /// Transfer batch not found.
    #[error("Transfer {0} not found")]
    TransferNotFound(TransferId),

    /// Transfer item not found in the batch.
    #[error("Transfer item {0} not found")]
    ItemNotFound(TransferItemId),

    /// Balance check found a negative line after the operation.
    #[error("Budget line {line} would end with negative amount {amount}")]
    NegativeBalance {
        /// The line.
        line: BudgetLineId,
        /// Its amount after the operation.
        amount: Decimal,
    },

    /// Data changed underneath the operation and retries ran out.
    #[error("Transfer {0} conflicted with a concurrent modification")]
    ConcurrentModification(TransferId),

    /// Budget lookup or storage failure.
    #[error(transparent)]
    Budget(#[from] BudgetError),
}

impl TransferError {
    /// Returns the HTTP-style status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidState { .. }
            | Self::InvalidBatchState { .. }
            | Self::SameEndpoint(_)
            | Self::MissingEndpoint(_)
            | Self::LineNotInSheet { .. }
            | Self::ScopeMismatch { .. }
            | Self::BatchNotEditable { .. }
            | Self::NameRequired => 400,

            Self::InsufficientAmount { .. } | Self::NegativeBalance { .. } => 422,

            Self::TransferNotFound(_) | Self::ItemNotFound(_) => 404,

            Self::ConcurrentModification(_) => 409,

            Self::Budget(err) => err.status_code(),
        }
    }

    /// Returns the error code for machine-readable output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } | Self::InvalidBatchState { .. } => "INVALID_STATE",
            Self::SameEndpoint(_) => "SAME_ENDPOINT",
            Self::InsufficientAmount { .. } => "INSUFFICIENT_AMOUNT",
            Self::MissingEndpoint(_) => "MISSING_ENDPOINT",
            Self::LineNotInSheet { .. } => "LINE_NOT_IN_SHEET",
            Self::ScopeMismatch { .. } => "SCOPE_MISMATCH",
            Self::BatchNotEditable { .. } => "TRANSFER_NOT_EDITABLE",
            Self::NameRequired => "NAME_REQUIRED",
            Self::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            Self::ItemNotFound(_) => "TRANSFER_ITEM_NOT_FOUND",
            Self::NegativeBalance { .. } => "NEGATIVE_BALANCE",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Budget(err) => err.error_code(),
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            422 => Self::BusinessRule(message),
            400 => Self::Validation(message),
            _ => Self::Storage(message),
        }
    }
}
