use crate::error::StorageError;
use crate::KeyValueStore;
use std::fmt;
use std::sync::Arc;

/// A lightweight, prefix-scoped view of another store.
///
/// Every key passed in is prefixed before it reaches the backing store, and
/// [`KeyValueStore::keys`] only reports keys carrying the prefix, with the prefix stripped.
/// Cloning is inexpensive: the view only holds reference-counted handles.
#[derive(Clone)]
pub struct NamespacedStore {
    store: Arc<dyn KeyValueStore>,
    prefix: Arc<str>,
}

impl NamespacedStore {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<Arc<str>>) -> Self {
        Self { store, prefix: prefix.into() }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the fully qualified key as seen by the backing store.
    #[must_use]
    pub fn qualify(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl fmt::Debug for NamespacedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespacedStore")
            .field("prefix", &self.prefix)
            .field("store", &self.store)
            .finish()
    }
}

impl KeyValueStore for NamespacedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.store.get(&self.qualify(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.store.set(&self.qualify(key), value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(&self.qualify(key))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&*self.prefix).map(str::to_owned))
            .collect())
    }

    fn probe(&self) -> Result<(), StorageError> {
        self.store.probe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn test_namespace_isolation() {
        let store = MemoryStore::new();
        let ns_a = store.namespace("a:");
        let ns_b = store.namespace("b:");

        ns_a.set("pkg", "1").unwrap();
        ns_b.set("pkg", "2").unwrap();
        store.set("unrelated", "x").unwrap();

        assert_eq!(ns_a.get("pkg").unwrap().as_deref(), Some("1"));
        assert_eq!(ns_b.get("pkg").unwrap().as_deref(), Some("2"));
        assert_eq!(ns_a.keys().unwrap(), vec!["pkg".to_owned()]);
        assert_eq!(store.get("a:pkg").unwrap().as_deref(), Some("1"));
    }
}
