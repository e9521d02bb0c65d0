//! Synchronous key-value stores used to persist overrides.
//!
//! Every store speaks the same small contract, [`KeyValueStore`]: string keys, string values,
//! synchronous `get`/`set`/`delete`/`keys`. Callers that need to know whether the store is
//! usable at all call [`KeyValueStore::probe`] once before relying on it.
//!
//! # Implementations
//!
//! 1.  **[`MemoryStore`]**: process-local map, cheap to clone, can be switched off to emulate
//!     a host that denies storage access.
//! 2.  **[`FileStore`]**: the whole key set is kept in memory and flushed to a JSON snapshot
//!     with an atomic swap (unique temp write + `fsync` + `rename`) on every mutation.
//! 3.  **[`NamespacedStore`]**: a prefix-scoped view over any other store.
//!
//! # Examples
//!
//! ```rust
//! use imo_storage::{KeyValueStore, MemoryStore, StorageError};
//!
//! # fn main() -> Result<(), StorageError> {
//! let store = MemoryStore::new();
//! store.set("import-map-override:react", "//localhost:8080/react.js")?;
//!
//! let overrides = store.namespace("import-map-override:");
//! assert_eq!(overrides.keys()?, vec!["react".to_owned()]);
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod file;
mod maintenance;
mod memory;
mod namespace;

pub use builder::FileStoreBuilder;
pub use error::{StorageError, StorageErrorExt};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use namespace::NamespacedStore;

use std::fmt::Debug;

const PROBE_KEY: &str = "__imo_storage_probe__";

/// Synchronous string key-value store.
///
/// Implementations use interior mutability; all methods take `&self` so a single store can be
/// shared behind an `Arc` by every component that persists state.
pub trait KeyValueStore: Debug + Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Enumerates every key currently present.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Checks that the store accepts a write/delete cycle.
    ///
    /// # Errors
    /// Returns whatever the first failing operation returned.
    fn probe(&self) -> Result<(), StorageError> {
        self.set(PROBE_KEY, PROBE_KEY)?;
        self.delete(PROBE_KEY)
    }
}
