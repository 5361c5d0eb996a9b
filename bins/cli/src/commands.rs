//! Command handlers.
//!
//! Every handler writes its human-readable output to the given writer so it
//! can be tested without a terminal.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use rust_decimal::Decimal;

use budgetctl_core::budget::{BudgetBook, BudgetLedger};
use budgetctl_core::transfer::{BudgetTransfer, TransferError, TransferItem, TransferOutcome};
use budgetctl_db::{BudgetRepository, MemoryStore, TransferRepository};
use budgetctl_shared::TransferConfig;
use budgetctl_shared::types::{BudgetControlId, BudgetLineId, BudgetScopeId, TransferId};

/// Repositories over one loaded state file.
pub struct Workspace {
    store: Arc<MemoryStore>,
    budgets: BudgetRepository,
    transfers: TransferRepository,
}

impl Workspace {
    /// Loads the state file at `path`.
    pub fn open(path: &Path, config: &TransferConfig) -> anyhow::Result<Self> {
        let store = MemoryStore::load(path).with_context(|| {
            format!(
                "Failed to read state file '{}'. Run 'budgetctl seed' to create one.",
                path.display()
            )
        })?;
        Ok(Self::from_store(Arc::new(store), config))
    }

    pub(crate) fn from_store(store: Arc<MemoryStore>, config: &TransferConfig) -> Self {
        Self {
            budgets: BudgetRepository::new(Arc::clone(&store)),
            transfers: TransferRepository::new(Arc::clone(&store), config),
            store,
        }
    }

    /// Writes the state back to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        self.store
            .save(path)
            .with_context(|| format!("Failed to write state file '{}'", path.display()))
    }

    /// Prints every scope with its sheets and lines, then every transfer.
    pub fn show(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let book = self.budgets.book()?;
        for scope in book.scopes() {
            writeln!(out, "Scope {} ({})", scope.name, scope.id)?;
            for sheet in book.sheets_in_scope(scope.id) {
                let status = if sheet.active { "active" } else { "inactive" };
                writeln!(out, "  Sheet {} ({}) [{status}]", sheet.name, sheet.id)?;
                for line in book.lines_of_sheet(sheet.id)? {
                    let entry = book.line(line)?;
                    writeln!(
                        out,
                        "    Line {} ({}) {}",
                        entry.name.as_deref().unwrap_or("-"),
                        entry.id,
                        entry.amount
                    )?;
                }
            }
        }

        let transfers = self.transfers.list()?;
        if transfers.is_empty() {
            writeln!(out, "No transfers.")?;
        }
        for transfer in &transfers {
            write_transfer(out, transfer, &book)?;
        }
        Ok(())
    }

    /// Creates an empty draft transfer.
    pub fn create(&self, name: &str, scope: BudgetScopeId, out: &mut impl Write) -> anyhow::Result<()> {
        let transfer = self.transfers.create(name, scope)?;
        writeln!(out, "Created transfer '{}' ({})", transfer.name, transfer.id)?;
        Ok(())
    }

    /// Adds an item between two lines; the sheets are taken from the lines.
    pub fn add_item(
        &self,
        transfer: TransferId,
        source_line: BudgetLineId,
        target_line: BudgetLineId,
        amount: Decimal,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        let Some(source_sheet) = self.budgets.get_line(source_line)?.line.sheet_id else {
            bail!("Budget line {source_line} has no budget control sheet");
        };
        let Some(target_sheet) = self.budgets.get_line(target_line)?.line.sheet_id else {
            bail!("Budget line {target_line} has no budget control sheet");
        };
        let item = TransferItem::new(source_sheet, target_sheet).with_lines(source_line, target_line, amount);
        let id = self.transfers.add_item(transfer, item)?;
        writeln!(out, "Added item {id} moving {amount}")?;
        Ok(())
    }

    /// Transfers a batch.
    pub fn transfer(&self, id: TransferId, out: &mut impl Write) -> anyhow::Result<()> {
        let outcome = self.transfers.transfer(id)?;
        write_outcome(out, id, &outcome)
    }

    /// Reverses a batch.
    pub fn reverse(&self, id: TransferId, out: &mut impl Write) -> anyhow::Result<()> {
        let outcome = self.transfers.reverse(id)?;
        write_outcome(out, id, &outcome)
    }

    /// Cancels a batch.
    pub fn cancel(&self, id: TransferId, out: &mut impl Write) -> anyhow::Result<()> {
        self.transfers.cancel(id)?;
        writeln!(out, "Transfer {id} cancelled")?;
        Ok(())
    }

    /// Deletes an unapplied batch.
    pub fn delete(&self, id: TransferId, out: &mut impl Write) -> anyhow::Result<()> {
        self.transfers.delete(id)?;
        writeln!(out, "Transfer {id} deleted")?;
        Ok(())
    }
}

fn write_outcome(out: &mut impl Write, id: TransferId, outcome: &TransferOutcome) -> anyhow::Result<()> {
    writeln!(
        out,
        "Transfer {id} is now {} ({} items, {} sheets checked)",
        outcome.state,
        outcome.items,
        outcome.touched_sheets.len()
    )?;
    Ok(())
}

fn write_transfer(out: &mut impl Write, transfer: &BudgetTransfer, book: &BudgetBook) -> anyhow::Result<()> {
    writeln!(
        out,
        "Transfer {} ({}) [{}]",
        transfer.name, transfer.id, transfer.state
    )?;
    for item in &transfer.items {
        let sheet_name = |id: BudgetControlId| {
            book.sheet(id)
                .map_or_else(|_| "?".to_string(), |sheet| sheet.name.clone())
        };
        writeln!(
            out,
            "  Item {} {} ({}) -> {} ({}) amount {} [{}]",
            item.id,
            sheet_name(item.source_control_id),
            live(item.source_amount(book)),
            sheet_name(item.target_control_id),
            live(item.target_amount(book)),
            item.amount,
            item.state
        )?;
    }
    Ok(())
}

fn live(amount: Result<Decimal, TransferError>) -> String {
    amount.map_or_else(|_| "-".to_string(), |amount| amount.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetctl_core::transfer::TransferState;
    use rust_decimal_macros::dec;

    fn workspace() -> (Workspace, TransferId) {
        let store = Arc::new(crate::seed::demo_store().unwrap());
        let workspace = Workspace::from_store(store, &TransferConfig::default());
        let id = workspace.transfers.list().unwrap()[0].id;
        (workspace, id)
    }

    fn render(workspace: &Workspace) -> String {
        let mut out = Vec::new();
        workspace.show(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_show_lists_everything() {
        let (workspace, _) = workspace();
        let text = render(&workspace);
        assert!(text.contains("Scope FY2026"));
        assert!(text.contains("Sheet Sales"));
        assert!(text.contains("Transfer Q1 reallocation"));
        assert!(text.contains("[draft]"));
    }

    #[test]
    fn test_transfer_then_reverse() {
        let (workspace, id) = workspace();
        let mut out = Vec::new();

        workspace.transfer(id, &mut out).unwrap();
        assert_eq!(workspace.transfers.get(id).unwrap().state, TransferState::Transfer);
        assert!(render(&workspace).contains("(70.00)"));

        workspace.reverse(id, &mut out).unwrap();
        assert_eq!(workspace.transfers.get(id).unwrap().state, TransferState::Reverse);
        assert!(String::from_utf8(out).unwrap().contains("is now reverse"));
    }

    #[test]
    fn test_add_item_resolves_sheets_from_lines() {
        let (workspace, _) = workspace();
        let book = workspace.budgets.book().unwrap();
        let lines: Vec<_> = book.lines().map(|line| line.id).collect();
        let scope = book.scopes().next().unwrap().id;

        let mut out = Vec::new();
        workspace.create("Extra", scope, &mut out).unwrap();
        let extra = workspace
            .transfers
            .list()
            .unwrap()
            .into_iter()
            .find(|t| t.name == "Extra")
            .unwrap();

        workspace
            .add_item(extra.id, lines[0], lines[1], dec!(5), &mut out)
            .unwrap();
        let item = &workspace.transfers.get(extra.id).unwrap().items[0];
        assert_eq!(Some(item.source_control_id), book.line(lines[0]).unwrap().sheet_id);
        assert_eq!(Some(item.target_control_id), book.line(lines[1]).unwrap().sheet_id);
    }

    #[test]
    fn test_cancel_then_delete_draft() {
        let (workspace, id) = workspace();
        let mut out = Vec::new();
        workspace.cancel(id, &mut out).unwrap();
        workspace.delete(id, &mut out).unwrap();
        assert!(render(&workspace).contains("No transfers."));
    }

    #[test]
    fn test_open_missing_file_mentions_seed() {
        let dir = tempfile::tempdir().unwrap();
        let err = Workspace::open(&dir.path().join("missing.json"), &TransferConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("budgetctl seed"));
    }
}
