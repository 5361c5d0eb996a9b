//! Manual budget transfers between budget control sheets.
//!
//! # Modules
//!
//! - `types` - Batch and item lifecycle states
//! - `error` - Transfer error types
//! - `item` - Single item commit/rollback state machine
//! - `batch` - The transfer batch aggregate and its editing rules
//! - `check` - Post-condition checks over touched sheets
//! - `journal` - Undo journal used by the atomic batch mode
//! - `service` - Batch transfer, reverse and cancel

pub mod batch;
pub mod check;
pub mod error;
pub mod item;
pub mod journal;
pub mod service;
pub mod types;

#[cfg(test)]
mod item_props;
#[cfg(test)]
mod service_props;

pub use batch::BudgetTransfer;
pub use check::{BudgetCheck, NonNegativeBudgetCheck, NoopBudgetCheck, budget_check};
pub use error::TransferError;
pub use item::TransferItem;
pub use journal::Journal;
pub use service::{TransferEngine, TransferOutcome};
pub use types::{ItemState, TransferState};
