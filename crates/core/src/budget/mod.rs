//! Budget lines, budget control sheets, and the ledger they live in.
//!
//! Transfers only see budget data through the [`BudgetLedger`] trait, so
//! the same state machine runs against an owned [`BudgetBook`], a staged
//! snapshot in a repository, or an undo journal.

pub mod book;
pub mod error;
pub mod ledger;
pub mod types;

pub use book::BudgetBook;
pub use error::BudgetError;
pub use ledger::BudgetLedger;
pub use types::{BudgetControlSheet, BudgetLine, BudgetScope};
