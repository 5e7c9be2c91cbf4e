//! Key-value persistence for motoyard.
//!
//! Vehicle data lives under a handful of string keys whose values are JSON
//! text. [`KeyValueStore`] is the seam every record operation goes through;
//! [`SqliteStore`] persists to disk and [`MemoryStore`] backs tests and dry
//! runs.

pub mod migrations;
pub mod schema;
mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

pub use sqlite::SqliteStore;

/// Asynchronous string key-value store.
///
/// Values are opaque text to the store; callers own the serialization.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any prior value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns `true` if a value was removed.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// All keys currently present, sorted.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::internal("memory store lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get("dadosMoto").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_set_and_get() {
        let store = MemoryStore::new();
        store.set("dadosMoto", r#"{"placa":"ABC1234"}"#).await.unwrap();
        assert_eq!(
            store.get("dadosMoto").await.unwrap().as_deref(),
            Some(r#"{"placa":"ABC1234"}"#)
        );
    }

    #[tokio::test]
    async fn test_memory_set_overwrites() {
        let store = MemoryStore::with_entries([("k", "old")]);
        store.set("k", "new").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_memory_remove() {
        let store = MemoryStore::with_entries([("k", "v")]);
        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_keys_sorted() {
        let store = MemoryStore::with_entries([("motos", "[]"), ("dadosMoto", "{}")]);
        assert_eq!(store.keys().await.unwrap(), vec!["dadosMoto", "motos"]);
    }
}
