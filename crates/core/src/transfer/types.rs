//! Lifecycle states for transfer batches and their items.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single transfer item.
///
/// Items only move forward:
/// - Draft → Transferred (commit)
/// - Transferred → Reversed (rollback)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    /// Editable, nothing applied yet.
    #[default]
    #[serde(rename = "draft")]
    Draft,
    /// Amount moved from source to target.
    #[serde(rename = "transfer")]
    Transferred,
    /// Amount moved back to source.
    #[serde(rename = "reverse")]
    Reversed,
}

impl ItemState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Transferred => "transfer",
            Self::Reversed => "reverse",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "transfer" | "transferred" => Some(Self::Transferred),
            "reverse" | "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of a transfer batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    /// Being prepared; items can be edited.
    #[default]
    Draft,
    /// All items transferred.
    Transfer,
    /// All items reversed.
    Reverse,
    /// Cancelled. Items untouched.
    Cancel,
}

impl TransferState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Transfer => "transfer",
            Self::Reverse => "reverse",
            Self::Cancel => "cancel",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "transfer" => Some(Self::Transfer),
            "reverse" => Some(Self::Reverse),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }

    /// Returns true if items may still be added, removed or changed.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
