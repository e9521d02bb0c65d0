use crate::error::StorageError;
use crate::namespace::NamespacedStore;
use crate::KeyValueStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
struct MemoryInner {
    entries: RwLock<BTreeMap<String, String>>,
    available: AtomicBool,
}

/// A process-local [`KeyValueStore`].
///
/// Clones share the same entries. The store can be switched off with
/// [`MemoryStore::set_available`], after which every operation fails with
/// [`StorageError::Unavailable`]; this mirrors hosts that deny storage access outright.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                entries: RwLock::new(BTreeMap::new()),
                available: AtomicBool::new(true),
            }),
        }
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects every operation.
    #[must_use]
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    /// Seeds a store from `(key, value)` pairs.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::default();
        store
            .inner
            .entries
            .write()
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        store
    }

    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Returns a prefix-scoped view sharing these entries.
    #[must_use]
    pub fn namespace(&self, prefix: &str) -> NamespacedStore {
        NamespacedStore::new(Arc::new(self.clone()), prefix)
    }

    /// Number of entries, regardless of availability.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable {
                message: "memory store is switched off".into(),
                context: None,
            })
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_available()?;
        Ok(self.inner.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.inner.entries.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.inner.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.ensure_available()?;
        Ok(self.inner.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("a", "1").unwrap();
        assert_eq!(other.get("a").unwrap().as_deref(), Some("1"));

        other.delete("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_unavailable_store_rejects_everything() {
        let store = MemoryStore::unavailable();

        assert!(matches!(store.get("a"), Err(StorageError::Unavailable { .. })));
        assert!(matches!(store.set("a", "1"), Err(StorageError::Unavailable { .. })));
        assert!(store.probe().is_err());

        store.set_available(true);
        assert!(store.probe().is_ok());
        assert_eq!(store.len(), 0, "probe must not leave entries behind");
    }
}
