use crate::builder::FileStoreBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::TMP_MARKER;
use crate::namespace::NamespacedStore;
use crate::KeyValueStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) struct FileInner {
    pub(crate) path: PathBuf,
    pub(crate) entries: RwLock<BTreeMap<String, String>>,
    pub(crate) tmp_counter: AtomicU64,
}

/// A [`KeyValueStore`] persisted as a single JSON snapshot file.
///
/// Reads are served from memory. Every mutation writes a complete new snapshot through an
/// atomic swap:
/// 1. The snapshot is written to a unique temporary file next to the target.
/// 2. The temporary file is synced to hardware (`fsync`).
/// 3. The temporary file is renamed over the target.
///
/// The in-memory state only changes after the swap succeeded, so a failed write leaves both
/// the file and the handle at the previous state.
///
/// # Example
///
/// ```rust
/// use imo_storage::{FileStore, KeyValueStore, StorageError};
///
/// # fn main() -> Result<(), StorageError> {
/// # let tmp = tempfile::tempdir().unwrap();
/// let store = FileStore::builder().path(tmp.path().join("store.json")).open()?;
/// store.set("import-map-overrides-disabled", "[]")?;
/// assert_eq!(store.keys()?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    pub(crate) inner: Arc<FileInner>,
}

impl FileStore {
    #[must_use = "The store is not opened until you call .open()"]
    pub fn builder() -> FileStoreBuilder {
        FileStoreBuilder::new()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Returns a prefix-scoped view sharing this snapshot.
    #[must_use]
    pub fn namespace(&self, prefix: &str) -> NamespacedStore {
        NamespacedStore::new(Arc::new(self.clone()), prefix)
    }

    /// Writes the current in-memory state to disk.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] on any filesystem failure.
    pub fn flush(&self) -> Result<(), StorageError> {
        let entries = self.inner.entries.read();
        self.persist(&entries)
    }

    fn mutate(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let mut entries = self.inner.entries.write();
        let mut next = entries.clone();
        if !apply(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let target = &self.inner.path;
        let temp = unique_tmp_path(target, &self.inner.tmp_counter);
        let payload = serde_json::to_vec_pretty(entries).context("Snapshot serialization failed")?;

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(&payload).context("Write failed")?;
            file.sync_all().context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&temp, target) {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::Io {
                source: err,
                context: Some(
                    format!("Atomic swap failed: {} -> {}", temp.display(), target.display())
                        .into(),
                ),
            });
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            sync_dir(parent);
        }

        debug!(path = %target.display(), entries = entries.len(), "Store snapshot saved atomically");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.get(key).is_none_or(|current| current != value) && {
                entries.insert(key.to_owned(), value.to_owned());
                true
            }
        })
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(|entries| entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.inner.entries.read().keys().cloned().collect())
    }

    fn probe(&self) -> Result<(), StorageError> {
        self.flush()
    }
}

fn sync_dir(path: &Path) {
    match fs::File::open(path) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("store");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{counter}", std::process::id()))
}
