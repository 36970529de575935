//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ConfigError, ConfigId};
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizStore` session and config operations.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("no active session")]
    NoActiveSession,
    #[error("no session config selected")]
    NoConfig,
    #[error("session config not found: {0}")]
    UnknownConfig(ConfigId),
    #[error("the current session has no incorrect answers to retry")]
    NothingToRetry,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors emitted when importing a question set.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImportError {
    /// The batch failed validation; nothing was added to the pool.
    #[error("import rejected with {} error(s)", errors.len())]
    Rejected { errors: Vec<String> },
}

impl ImportError {
    /// Validation messages in discovery order.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        match self {
            ImportError::Rejected { errors } => errors,
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
