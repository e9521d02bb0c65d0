use crate::error::{StorageError, StorageErrorExt};
use crate::file::{FileInner, FileStore};
use crate::maintenance;
use parking_lot::RwLock;
use private::Sealed;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tracing::info;

#[derive(Debug, Clone)]
struct FileStoreConfig {
    create: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self { create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoPath;
#[derive(Debug)]
pub struct WithPath(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoPath {}
impl Sealed for WithPath {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct FileStoreBuilder<S: Sealed = NoPath> {
    state: S,
    config: FileStoreConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> FileStoreBuilder<S> {
    #[must_use = "Sets whether the snapshot should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> FileStoreBuilder<N> {
        FileStoreBuilder { state, config: self.config }
    }
}

impl FileStoreBuilder<NoPath> {
    #[must_use = "Creates a new file store builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the snapshot file path for the store"]
    pub fn path(self, path: impl Into<PathBuf>) -> FileStoreBuilder<WithPath> {
        self.transition(WithPath(path.into()))
    }
}

impl FileStoreBuilder<WithPath> {
    /// Consumes the configuration and opens the store.
    ///
    /// Boot sequence:
    /// 1. **Bootstrapping**: creates the parent directory and an empty snapshot when
    ///    `create(true)` was set and the file is missing.
    /// 2. **Loading**: reads the snapshot into memory.
    /// 3. **Self-Healing**: removes stale temp files left by interrupted writes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the snapshot is missing and `create` is false, or the
    /// file cannot be read. Returns [`StorageError::Snapshot`] if it is not a JSON object of
    /// strings.
    pub fn open(self) -> Result<FileStore, StorageError> {
        let path = self.state.0;

        let entries: BTreeMap<String, String> = if path.exists() {
            let raw = fs::read(&path)
                .context(format!("Failed to read store snapshot: {}", path.display()))?;
            serde_json::from_slice(&raw)
                .context(format!("Malformed store snapshot: {}", path.display()))?
        } else if self.config.create {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .context(format!("Failed to bootstrap store directory: {}", parent.display()))?;
            }
            info!(path = %path.display(), "Bootstrapped empty store snapshot");
            BTreeMap::new()
        } else {
            return Err(StorageError::Io {
                source: std::io::ErrorKind::NotFound.into(),
                context: Some(format!("Store snapshot not found: {}", path.display()).into()),
            });
        };

        maintenance::purge_tmp(&path);

        let store = FileStore {
            inner: Arc::new(FileInner {
                path,
                entries: RwLock::new(entries),
                tmp_counter: AtomicU64::new(1),
            }),
        };

        if !store.inner.path.exists() {
            store.flush()?;
        }

        Ok(store)
    }
}
