//! This module provides the persistent key-value store used to mirror recent
//! log entries, with a `sled` backed implementation and an in-memory one.
use crate::error::LoggerError;
use anyhow::Result;
use sled::Db;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// A string key-value store with local-storage semantics.
pub trait KeyValueStore: Send + Sync {
    /// Retrieves the value stored under `key`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the value cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// This function will return an error if the write fails, including when
    /// the value exceeds the store's quota.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// This function will return an error if the removal fails.
    fn remove_item(&self, key: &str) -> Result<()>;
}

fn check_quota(quota: Option<usize>, value: &str) -> Result<()> {
    match quota {
        Some(quota) if value.len() > quota => Err(LoggerError::QuotaExceeded {
            size: value.len(),
            quota,
        }
        .into()),
        _ => Ok(()),
    }
}

/// A `KeyValueStore` implementation using `sled` for storage.
pub struct SledKeyValueStore {
    tree: sled::Tree,
    quota: Option<usize>,
}

impl SledKeyValueStore {
    /// Creates a new `SledKeyValueStore`.
    ///
    /// # Arguments
    ///
    /// * `db` - The `sled::Db` instance to use for storage.
    ///
    /// # Errors
    ///
    /// This function will return an error if the `local_storage` tree cannot
    /// be opened.
    pub fn new(db: Db) -> Result<Self> {
        let tree = db.open_tree("local_storage")?;
        Ok(Self { tree, quota: None })
    }

    /// Rejects values larger than `bytes`, the way a browser rejects writes
    /// over its storage quota.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Flushes pending writes to disk.
    ///
    /// # Errors
    ///
    /// This function will return an error if the flush fails.
    pub fn flush(&self) -> Result<()> {
        self.tree.flush()?;
        Ok(())
    }
}

impl KeyValueStore for SledKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match self.tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes.to_vec())?)),
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        check_quota(self.quota, value)?;
        self.tree.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.tree.remove(key.as_bytes())?;
        Ok(())
    }
}

/// A process-local `KeyValueStore`.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        check_quota(self.quota, value)?;
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sled_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path().join("db")).unwrap();
        let store = SledKeyValueStore::new(db).unwrap();

        assert_eq!(store.get_item("k").unwrap(), None);
        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v2"));

        store.remove_item("k").unwrap();
        store.remove_item("k").unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);
    }

    #[test]
    fn quota_rejects_large_values_and_keeps_old_one() {
        let store = MemoryKeyValueStore::new().with_quota(4);
        store.set_item("k", "1234").unwrap();

        let err = store.set_item("k", "12345").unwrap_err();
        assert!(err.to_string().contains("quota"));
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("1234"));
    }
}
