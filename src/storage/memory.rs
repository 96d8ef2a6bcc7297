//! Session-scoped in-memory store.

use dashmap::DashMap;

use crate::error::StorageResult;
use crate::storage::traits::SyncBackend;

/// In-memory key/value store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SyncBackend for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).map(|raw| raw.value().clone()))
    }

    fn set(&self, key: &str, raw: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_operations() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("clicks").unwrap(), None);

        store.set("clicks", "3").unwrap();
        assert_eq!(store.get("clicks").unwrap().as_deref(), Some("3"));
        assert_eq!(store.len(), 1);

        store.set("clicks", "4").unwrap();
        assert_eq!(store.get("clicks").unwrap().as_deref(), Some("4"));

        store.clear("clicks").unwrap();
        store.clear("clicks").unwrap();
        assert_eq!(store.get("clicks").unwrap(), None);
        assert_eq!(store.backend_name(), "memory");
    }
}
