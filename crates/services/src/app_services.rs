use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::store::QuizStore;

/// Assembles the storage backend and a loaded store for the binary.
pub struct AppServices {
    storage: Storage,
    store: QuizStore,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and load persisted state.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock).await)
    }

    /// Build services over an already configured backend.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Self {
        let store = QuizStore::load(clock, storage.kv.clone()).await;
        Self { storage, store }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn store(&self) -> &QuizStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut QuizStore {
        &mut self.store
    }

    #[must_use]
    pub fn into_store(self) -> QuizStore {
        self.store
    }
}
