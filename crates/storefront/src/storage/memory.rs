//! In-memory key-value storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{KeyValueStorage, StorageError};

/// In-memory storage, cheaply cloneable (clones share the same map).
///
/// Used by tests and as a fallback when no storage path is usable. An
/// optional byte quota makes the cache's quota-recovery path testable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    map: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Unbounded in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys plus values exceed `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                map: Mutex::new(HashMap::new()),
                quota_bytes: Some(quota_bytes),
            }),
        }
    }

    fn used_bytes(map: &HashMap<String, String>) -> usize {
        map.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .map
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self
            .inner
            .map
            .lock()
            .map_err(|_| StorageError::Unavailable)?;

        if let Some(quota) = self.inner.quota_bytes {
            let existing = map.get(key).map_or(0, |v| key.len() + v.len());
            let projected = Self::used_bytes(&map) - existing + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }

        map.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.inner.map.lock() {
            map.remove(key);
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner.map.lock().map_or_else(
            |_| Vec::new(),
            |map| {
                map.keys()
                    .filter(|k| k.starts_with(prefix))
                    .cloned()
                    .collect()
            },
        )
    }
}
