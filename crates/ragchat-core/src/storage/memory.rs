//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{KeyValueStorage, StorageError};

/// Key-value storage held in process memory.
///
/// Used by tests and by ephemeral runs. An optional quota (in bytes, counting
/// keys and values) mimics the fixed budget of browser local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once `bytes` would be exceeded.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(id).cloned())
    }

    fn set(&self, id: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values();

        if let Some(quota) = self.quota {
            let used: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != id)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = id.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }

        values.insert(id.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), StorageError> {
        self.values().remove(id);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.values().keys().cloned().collect())
    }
}
