//! Core budget control logic for budgetctl.
//!
//! This crate contains pure business logic with ZERO storage dependencies.
//! Budget data is reached only through the `BudgetLedger` trait.
//!
//! # Modules
//!
//! - `budget` - Budget lines, control sheets, scopes and the ledger trait
//! - `transfer` - Transfer items, batches and their state machines

pub mod budget;
pub mod transfer;
