use super::KeyValueStorage;
use crate::error::{LexchatError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-process key-value storage
///
/// Behaves like browser storage: an optional byte quota covers the summed
/// length of every key and value, and a write that would exceed it is
/// rejected without touching the existing value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Create an empty, unbounded storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage limited to `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes currently held (keys plus values)
    pub fn used_bytes(&self) -> usize {
        self.lock()
            .map(|entries| entries.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| LexchatError::Storage("memory storage lock poisoned".to_string()).into())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;

        if let Some(limit) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let required = others + key.len() + value.len();
            if required > limit {
                return Err(LexchatError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    limit,
                }
                .into());
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_tracks_used_bytes() {
        let storage = MemoryStorage::new();
        storage.set("ab", "cde").unwrap();
        storage.set("f", "g").unwrap();
        assert_eq!(storage.used_bytes(), 7);

        storage.set("ab", "c").unwrap();
        assert_eq!(storage.used_bytes(), 5);
    }

    #[test]
    fn test_memory_storage_quota_is_all_or_nothing() {
        let storage = MemoryStorage::with_quota(10);
        storage.set("k", "12345").unwrap();

        let err = storage.set("k", "1234567890").unwrap_err();
        assert!(LexchatError::is_quota_exceeded(&err));
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("12345"));
    }

    #[test]
    fn test_memory_storage_replacing_value_only_counts_new_size() {
        let storage = MemoryStorage::with_quota(10);
        storage.set("k", "123456789").unwrap();
        // Old value is replaced, not added to
        storage.set("k", "987654321").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("987654321"));
    }
}
