#![forbid(unsafe_code)]

pub mod json;
pub mod repository;
pub mod sqlite;

pub use json::keys;
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
