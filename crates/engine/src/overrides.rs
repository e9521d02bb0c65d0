use crate::error::EngineError;
use crate::events::ChangeBus;
use crate::map::{ResolutionMap, SpecifierMap};
use crate::mirror::{self, MirrorSink};
use imo_storage::{KeyValueStore, NamespacedStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Store key prefix for a single override.
pub const OVERRIDE_PREFIX: &str = "import-map-override:";
/// Store key of the JSON array of disabled specifiers.
pub const DISABLED_KEY: &str = "import-map-overrides-disabled";

/// `@scope/pkg` becomes `scope-pkg`.
pub(crate) fn file_name_for(specifier: &str) -> String {
    specifier.replace('@', "").replace('/', "-")
}

/// Expands a port shorthand into a local dev-server URL.
///
/// ```rust
/// assert_eq!(imo_engine::url_from_port("@demo/pkg", "8080"), "//localhost:8080/demo-pkg.js");
/// ```
#[must_use]
pub fn url_from_port(specifier: &str, port: &str) -> String {
    format!("//localhost:{port}/{}.js", file_name_for(specifier))
}

fn is_port(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Persisted per-specifier overrides and their disabled flags.
///
/// Every mutation is written through to the store before the call returns
/// and schedules one deferred [`ImoEvent::Change`](crate::ImoEvent::Change).
#[derive(Debug, Clone)]
pub struct OverrideStore {
    store: Arc<dyn KeyValueStore>,
    entries: NamespacedStore,
    query_overrides: Arc<SpecifierMap>,
    mirror: Option<Arc<dyn MirrorSink>>,
    changes: ChangeBus,
}

impl OverrideStore {
    pub fn new(store: Arc<dyn KeyValueStore>, changes: ChangeBus) -> Self {
        let entries = NamespacedStore::new(Arc::clone(&store), OVERRIDE_PREFIX);
        Self { store, entries, query_overrides: Arc::default(), mirror: None, changes }
    }

    /// Overrides supplied by the page URL. They sit above persisted entries
    /// but are never written to the store.
    #[must_use]
    pub fn with_query_overrides(mut self, overrides: SpecifierMap) -> Self {
        self.query_overrides = Arc::new(overrides);
        self
    }

    #[must_use]
    pub fn with_mirror(mut self, sink: Arc<dyn MirrorSink>) -> Self {
        self.mirror = Some(sink);
        self
    }

    /// Persists `specifier -> url` and clears its disabled flag.
    ///
    /// A digits-only `url_or_port` is treated as a port on localhost.
    /// Returns the active override map after the write.
    pub fn add_override(&self, specifier: &str, url_or_port: &str) -> Result<ResolutionMap, EngineError> {
        let url = if is_port(url_or_port) {
            url_from_port(specifier, url_or_port)
        } else {
            url_or_port.to_owned()
        };

        self.entries.set(specifier, &url)?;
        self.enable_override(specifier)?;
        if let Some(sink) = &self.mirror {
            sink.write(&mirror::set_record(specifier, &url));
        }
        debug!(specifier, url = %url, "Override added");

        self.changes.changed();
        self.get_override_map(false)
    }

    /// All overrides, minus disabled ones unless `include_disabled`.
    pub fn get_override_map(&self, include_disabled: bool) -> Result<ResolutionMap, EngineError> {
        let mut imports = SpecifierMap::new();
        for specifier in self.entries.keys()? {
            if let Some(url) = self.entries.get(&specifier)? {
                imports.insert(specifier, url);
            }
        }
        imports.extend(self.query_overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        if !include_disabled {
            let disabled = self.get_disabled_overrides()?;
            imports.retain(|specifier, _| !disabled.contains(specifier));
        }

        Ok(ResolutionMap { imports, scopes: BTreeMap::new() })
    }

    /// Deletes `specifier` and clears its disabled flag.
    ///
    /// Returns `true` when a persisted entry existed.
    pub fn remove_override(&self, specifier: &str) -> Result<bool, EngineError> {
        let existed = self.entries.get(specifier)?.is_some();
        self.entries.delete(specifier)?;
        self.enable_override(specifier)?;
        if let Some(sink) = &self.mirror {
            sink.write(&mirror::removal_record(specifier));
        }
        debug!(specifier, existed, "Override removed");

        self.changes.changed();
        Ok(existed)
    }

    /// Removes every override, disabled ones included, and empties the disabled set.
    pub fn reset_overrides(&self) -> Result<ResolutionMap, EngineError> {
        for specifier in self.get_override_map(true)?.imports.keys() {
            self.remove_override(specifier)?;
        }
        self.store.delete(DISABLED_KEY)?;

        self.changes.changed();
        self.get_override_map(false)
    }

    pub fn has_overrides(&self) -> Result<bool, EngineError> {
        Ok(!self.get_override_map(false)?.imports.is_empty())
    }

    /// Returns `true` only if `specifier` was enabled before.
    pub fn disable_override(&self, specifier: &str) -> Result<bool, EngineError> {
        let mut disabled = self.get_disabled_overrides()?;
        if disabled.iter().any(|s| s == specifier) {
            return Ok(false);
        }

        disabled.push(specifier.to_owned());
        self.write_disabled(&disabled)?;
        self.changes.changed();
        Ok(true)
    }

    /// Returns `true` only if `specifier` was disabled before.
    pub fn enable_override(&self, specifier: &str) -> Result<bool, EngineError> {
        let mut disabled = self.get_disabled_overrides()?;
        let before = disabled.len();
        disabled.retain(|s| s != specifier);
        if disabled.len() == before {
            return Ok(false);
        }

        self.write_disabled(&disabled)?;
        self.changes.changed();
        Ok(true)
    }

    pub fn is_disabled(&self, specifier: &str) -> Result<bool, EngineError> {
        Ok(self.get_disabled_overrides()?.iter().any(|s| s == specifier))
    }

    /// Disabled specifiers in the order they were disabled.
    pub fn get_disabled_overrides(&self) -> Result<Vec<String>, EngineError> {
        let Some(raw) = self.store.get(DISABLED_KEY)? else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key = DISABLED_KEY, error = %e, "Ignoring unreadable disabled override list");
            Vec::new()
        }))
    }

    fn write_disabled(&self, disabled: &[String]) -> Result<(), EngineError> {
        let encoded = serde_json::to_string(disabled)?;
        self.store.set(DISABLED_KEY, &encoded)?;
        Ok(())
    }
}
