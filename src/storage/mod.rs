//! Persistence of hotkeys and window geometry.
//!
//! The core treats storage as a flat key → bytes map. [`JsonFileStore`]
//! keeps one JSON document per key on local disk; [`MemoryStore`] backs
//! tests and headless runs.

pub mod file_store;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;

pub use file_store::JsonFileStore;

/// Synchronous, local key-value persistence.
pub trait PersistenceStore: Send + Sync {
    /// Read the value stored under `key`; `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
