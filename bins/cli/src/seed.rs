//! Demo state for local development.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use rust_decimal::Decimal;
use tracing::info;

use budgetctl_core::transfer::TransferItem;
use budgetctl_db::{BudgetRepository, CreateLineInput, MemoryStore, TransferRepository};
use budgetctl_shared::TransferConfig;

/// Sheet name, line name, starting amount in cents.
const SHEETS: [(&str, &str, i64); 4] = [
    ("Sales", "Travel", 10_000),
    ("Operations", "Facilities", 2_000),
    ("R&D", "Equipment", 5_000),
    ("Support", "Training", 0),
];

/// One scope, four sheets with one line each, and a draft transfer moving
/// 30.00 from Sales to Operations and 10.00 from R&D to Support.
pub fn demo_store() -> anyhow::Result<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let budgets = BudgetRepository::new(Arc::clone(&store));
    let transfers = TransferRepository::new(Arc::clone(&store), &TransferConfig::default());

    let scope = budgets.create_scope("FY2026")?;
    let mut endpoints = Vec::new();
    for (sheet_name, line_name, cents) in SHEETS {
        let sheet = budgets.create_sheet(sheet_name, scope.id)?;
        let line = budgets.create_line(CreateLineInput {
            sheet_id: Some(sheet.id),
            name: Some(line_name.to_string()),
            amount: Decimal::new(cents, 2),
        })?;
        endpoints.push((sheet.id, line.id));
    }

    let transfer = transfers.create("Q1 reallocation", scope.id)?;
    for (from, to, cents) in [(0, 1, 3_000), (2, 3, 1_000)] {
        let (source_sheet, source_line) = endpoints[from];
        let (target_sheet, target_line) = endpoints[to];
        transfers.add_item(
            transfer.id,
            TransferItem::new(source_sheet, target_sheet).with_lines(
                source_line,
                target_line,
                Decimal::new(cents, 2),
            ),
        )?;
    }

    Ok(MemoryStore::from_document(store.to_document()?)?)
}

/// Writes the demo state to `path`. Refuses to overwrite unless `force`.
pub fn write(path: &Path, force: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "State file '{}' already exists. Pass --force to overwrite it.",
            path.display()
        );
    }
    let store = demo_store().context("Failed to build demo state")?;
    store
        .save(path)
        .with_context(|| format!("Failed to write state file '{}'", path.display()))?;
    info!(path = %path.display(), "Demo state written");
    writeln!(out, "Wrote demo state to {}", path.display())?;
    Ok(())
}
