//! Application configuration management.

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Transfer workflow configuration.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// How a batch operation treats a failure part-way through its items.
///
/// `Atomic` is the default. `Literal` applies items one by one without
/// rollback and has to be selected explicitly with `mode = "literal"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Items processed before the failing one stay applied.
    Literal,
    /// Every item and line touched by the batch is restored on failure.
    #[default]
    Atomic,
}

/// Post-condition run over the sheets touched by a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceCheckKind {
    /// Collects the touched sheets and asserts nothing.
    #[default]
    Noop,
    /// Fails when any line of a touched sheet is negative.
    NonNegative,
}

/// Transfer workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Partial-failure semantics of batch transfer and reverse.
    #[serde(default)]
    pub mode: BatchMode,
    /// Post-condition check after batch transfer and reverse.
    #[serde(default)]
    pub balance_check: BalanceCheckKind,
    /// Reject `cancel` unless the batch is still a draft.
    #[serde(default)]
    pub restrict_cancel_to_draft: bool,
    /// How many times a conflicting batch operation is retried.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

fn default_max_conflict_retries() -> u32 {
    3
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::default(),
            balance_check: BalanceCheckKind::default(),
            restrict_cancel_to_draft: false,
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "budgetctl=info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest priority first: `config/default`, `config/{RUN_MODE}`,
    /// then `BUDGETCTL__*` environment variables (`__` separates sections).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a source cannot be read or a value does
    /// not parse.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BUDGETCTL").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
