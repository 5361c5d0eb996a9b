//! Repository abstractions for data access.
//!
//! Repositories share one [`MemoryStore`](crate::store::MemoryStore) and
//! hide its locking and versioning from callers.

pub mod budget;
pub mod transfer;

pub use budget::{BudgetLineView, BudgetRepository, CreateLineInput};
pub use transfer::TransferRepository;
