//! Typed JSON documents on top of a [`KeyValueStore`].
//!
//! Reads and writes never fail upward: a missing, unreadable or corrupt
//! document yields the fallback, and a failed write is logged and dropped.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::{KeyValueStore, StorageError};

/// Keys of the persisted documents.
pub mod keys {
    /// The question pool, an array of questions.
    pub const QUESTIONS: &str = "recall_questions";
    /// Saved session configurations, an array of configs.
    pub const SESSION_CONFIGS: &str = "recall_sessions";
}

/// Strict read: distinguishes "absent" from backend or parse failures.
///
/// # Errors
///
/// Returns `StorageError::Serialization` when the stored text is not valid
/// JSON for `T`, or the backend error when it cannot be read.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Strict write of a whole document.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the backend write fails.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw =
        serde_json::to_string(value).map_err(|err| StorageError::Serialization(err.to_string()))?;
    store.set(key, &raw).await
}

/// Read `key`, falling back to `fallback` when absent or unreadable.
pub async fn load_or<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, fallback: T) -> T {
    match read_json(store, key).await {
        Ok(Some(value)) => value,
        Ok(None) => fallback,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to load persisted document, using fallback");
            fallback
        }
    }
}

/// Write `key`, logging instead of returning any failure.
pub async fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(err) = write_json(store, key, value).await {
        tracing::warn!(key, error = %err, "failed to persist document");
    }
}

/// Delete `key`, logging instead of returning any failure.
pub async fn discard(store: &dyn KeyValueStore, key: &str) {
    if let Err(err) = store.remove(key).await {
        tracing::warn!(key, error = %err, "failed to remove persisted document");
    }
}
