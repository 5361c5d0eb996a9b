//! Versioned in-memory store.
//!
//! Every budget line and transfer carries a version that increases on each
//! write. Batch operations read a snapshot, work on it, and only publish
//! their writes if none of the versions they read have moved.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use budgetctl_core::budget::{BudgetBook, BudgetError};
use budgetctl_core::transfer::BudgetTransfer;
use budgetctl_shared::types::{BudgetLineId, TransferId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or saving a store document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not a valid store document.
    #[error("Invalid store document: {0}")]
    Json(#[from] serde_json::Error),

    /// Document references data that does not exist.
    #[error(transparent)]
    Budget(#[from] BudgetError),
}

/// A value together with its write version.
#[derive(Debug, Clone)]
pub(crate) struct Versioned<T> {
    /// The stored value.
    pub(crate) value: T,
    /// Incremented on every write, starting at 1.
    pub(crate) version: u64,
}

impl<T> Versioned<T> {
    pub(crate) fn new(value: T) -> Self {
        Self { value, version: 1 }
    }

    pub(crate) fn replace(&mut self, value: T) {
        self.value = value;
        self.version += 1;
    }
}

/// Serializable form of the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Scopes, sheets and lines.
    #[serde(default)]
    pub budget: BudgetBook,
    /// Transfer batches with their items.
    #[serde(default)]
    pub transfers: Vec<BudgetTransfer>,
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) book: BudgetBook,
    pub(crate) line_versions: BTreeMap<BudgetLineId, u64>,
    pub(crate) transfers: BTreeMap<TransferId, Versioned<BudgetTransfer>>,
    /// Bumped when lines are added or removed, or a sheet changes.
    pub(crate) structure_version: u64,
}

impl StoreState {
    pub(crate) fn line_version(&self, line: BudgetLineId) -> u64 {
        self.line_versions.get(&line).copied().unwrap_or(0)
    }

    pub(crate) fn bump_line(&mut self, line: BudgetLineId) {
        *self.line_versions.entry(line).or_insert(0) += 1;
    }
}

/// Shared, thread-safe store backing the repositories.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a document. All versions start at 1.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Budget` if a sheet, line or transfer refers to
    /// a scope or sheet the document does not contain.
    pub fn from_document(document: StoreDocument) -> Result<Self, StoreError> {
        document.budget.validate()?;
        for transfer in &document.transfers {
            document.budget.scope(transfer.scope_id)?;
        }

        let line_versions = document.budget.lines().map(|line| (line.id, 1)).collect();
        let transfers = document
            .transfers
            .into_iter()
            .map(|transfer| (transfer.id, Versioned::new(transfer)))
            .collect();
        Ok(Self {
            state: RwLock::new(StoreState {
                book: document.budget,
                line_versions,
                transfers,
                structure_version: 1,
            }),
        })
    }

    /// Copies the current content into a document.
    pub fn to_document(&self) -> Result<StoreDocument, BudgetError> {
        let state = self.read()?;
        Ok(StoreDocument {
            budget: state.book.clone(),
            transfers: state
                .transfers
                .values()
                .map(|entry| entry.value.clone())
                .collect(),
        })
    }

    /// Reads a JSON document from `path`.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let document: StoreDocument = serde_json::from_str(&raw)?;
        Self::from_document(document)
    }

    /// Writes the store as pretty-printed JSON to `path`.
    ///
    /// The document goes to a temporary file next to `path` that is renamed
    /// over it once complete, so a failed save leaves the previous file as
    /// it was.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let document = self.to_document()?;
        write_atomic(path, |file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.flush()?;
            Ok(())
        })
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, BudgetError> {
        self.state
            .read()
            .map_err(|_| BudgetError::Storage("store lock poisoned".to_string()))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, BudgetError> {
        self.state
            .write()
            .map_err(|_| BudgetError::Storage("store lock poisoned".to_string()))
    }
}

/// Runs `write` against a temporary file in the directory of `path`, then
/// moves the file into place. The temporary file is removed if `write` fails.
fn write_atomic<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut File) -> Result<(), StoreError>,
{
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetctl_core::budget::{BudgetControlSheet, BudgetLedger, BudgetLine, BudgetScope};
    use budgetctl_shared::types::{BudgetControlId, BudgetScopeId};
    use rust_decimal_macros::dec;

    fn document() -> (StoreDocument, BudgetLineId) {
        let mut book = BudgetBook::new();
        let scope = book.insert_scope(BudgetScope::new("FY2026"));
        let sheet = book
            .insert_sheet(BudgetControlSheet::new("Sales", scope))
            .unwrap();
        let line = book
            .insert_line(BudgetLine::new(Some(sheet), dec!(100)))
            .unwrap();
        let transfer = BudgetTransfer::new("Move", scope).unwrap();
        (
            StoreDocument {
                budget: book,
                transfers: vec![transfer],
            },
            line,
        )
    }

    #[test]
    fn test_from_document_starts_versions_at_one() {
        let (document, line) = document();
        let store = MemoryStore::from_document(document).unwrap();
        let state = store.read().unwrap();
        assert_eq!(state.line_version(line), 1);
        assert!(state.transfers.values().all(|entry| entry.version == 1));
    }

    #[test]
    fn test_save_and_load() {
        let (document, line) = document();
        let store = MemoryStore::from_document(document).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        store.save(&path).unwrap();
        let loaded = MemoryStore::load(&path).unwrap();

        let state = loaded.read().unwrap();
        assert_eq!(state.book.amount(line).unwrap(), dec!(100));
        assert_eq!(state.transfers.len(), 1);
    }

    #[test]
    fn test_interrupted_write_keeps_previous_file() {
        let (document, line) = document();
        let store = MemoryStore::from_document(document).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        store.save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let result = write_atomic(&path, |file| {
            file.write_all(b"{\"budget\": {\"sco")?;
            Err(StoreError::Io(std::io::Error::other("disk full")))
        });

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.read().unwrap().book.amount(line).unwrap(), dec!(100));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_replaces_previous_file() {
        let (document, _) = document();
        let store = MemoryStore::from_document(document).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "stale").unwrap();

        store.save(&path).unwrap();

        assert!(MemoryStore::load(&path).is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_rejects_line_of_unknown_sheet() {
        let (document, line) = document();
        let missing = BudgetControlId::new();
        let mut value = serde_json::to_value(&document).unwrap();
        value["budget"]["lines"][line.to_string().as_str()]["sheet_id"] = serde_json::json!(missing);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, value.to_string()).unwrap();

        assert!(matches!(
            MemoryStore::load(&path),
            Err(StoreError::Budget(BudgetError::SheetNotFound(id))) if id == missing
        ));
    }

    #[test]
    fn test_from_document_rejects_transfer_of_unknown_scope() {
        let (mut document, _) = document();
        document.transfers = vec![BudgetTransfer::new("Stray", BudgetScopeId::new()).unwrap()];
        assert!(matches!(
            MemoryStore::from_document(document),
            Err(StoreError::Budget(BudgetError::ScopeNotFound(_)))
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(MemoryStore::load(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_versioned_replace_bumps_version() {
        let mut entry = Versioned::new(1);
        entry.replace(2);
        assert_eq!(entry.value, 2);
        assert_eq!(entry.version, 2);
    }
}
