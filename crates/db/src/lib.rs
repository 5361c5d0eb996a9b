//! Storage layer for budget data and transfer batches.
//!
//! This crate provides:
//! - A versioned in-memory store with JSON load/save
//! - Repository abstractions for budgets and transfers
//! - Optimistic concurrency for batch transfer and reverse

pub mod repositories;
pub mod store;

mod staging;

pub use repositories::{BudgetLineView, BudgetRepository, CreateLineInput, TransferRepository};
pub use store::{MemoryStore, StoreDocument, StoreError};
