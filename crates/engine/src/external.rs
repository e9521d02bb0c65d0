use crate::error::EngineError;
use crate::events::ChangeBus;
use crate::map::{self, ResolutionMap};
use crate::retrieve::{Retriever, retrieve_map};
use fxhash::FxHashMap;
use imo_storage::KeyValueStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

/// Store key of the JSON array of external map URLs, in insertion order.
pub const EXTERNAL_MAPS_KEY: &str = "import-map-overrides-external-maps";

/// Where an external map stands for the lifetime of this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Unfetched,
    Fetching,
    Valid,
    Invalid,
}

/// One memoized retrieval per URL. Concurrent callers wait on the same cell.
#[derive(Debug, Default)]
struct FetchCache {
    cells: Mutex<FxHashMap<String, Arc<OnceCell<ResolutionMap>>>>,
}

impl FetchCache {
    fn cell(&self, url: &str) -> Arc<OnceCell<ResolutionMap>> {
        Arc::clone(self.cells.lock().entry(url.to_owned()).or_default())
    }

    fn peek(&self, url: &str) -> Option<Arc<OnceCell<ResolutionMap>>> {
        self.cells.lock().get(url).cloned()
    }
}

/// Persisted list of external override maps plus their fetch results.
#[derive(Debug)]
pub struct ExternalMapRegistry {
    store: Arc<dyn KeyValueStore>,
    retriever: Arc<dyn Retriever>,
    base: Url,
    cache: FetchCache,
    invalid: Mutex<Vec<String>>,
    changes: ChangeBus,
}

impl ExternalMapRegistry {
    /// `base` is the document base that relative URLs are resolved against.
    pub fn new(store: Arc<dyn KeyValueStore>, retriever: Arc<dyn Retriever>, base: Url, changes: ChangeBus) -> Self {
        Self {
            store,
            retriever,
            base,
            cache: FetchCache::default(),
            invalid: Mutex::new(Vec::new()),
            changes,
        }
    }

    /// Persisted URLs, sorted.
    pub fn get_external_overrides(&self) -> Result<Vec<String>, EngineError> {
        let mut urls = self.read_urls()?;
        urls.sort();
        Ok(urls)
    }

    /// Appends `url` (resolved against the document base).
    ///
    /// Returns `false` without writing when it cannot be resolved or is already listed.
    pub fn add_external_override(&self, url: &str) -> Result<bool, EngineError> {
        let Some(resolved) = self.resolve(url).map(String::from) else {
            warn!(url, "Ignoring external map URL that cannot be resolved");
            return Ok(false);
        };

        let mut urls = self.read_urls()?;
        if urls.iter().any(|u| *u == resolved) {
            return Ok(false);
        }

        urls.push(resolved);
        self.write_urls(&urls)?;
        self.changes.changed();
        Ok(true)
    }

    pub fn remove_external_override(&self, url: &str) -> Result<bool, EngineError> {
        let Some(resolved) = self.resolve(url).map(String::from) else {
            return Ok(false);
        };

        let mut urls = self.read_urls()?;
        let before = urls.len();
        urls.retain(|u| *u != resolved);
        if urls.len() == before {
            return Ok(false);
        }

        self.write_urls(&urls)?;
        self.changes.changed();
        Ok(true)
    }

    /// Fetches one external map, at most once per URL.
    ///
    /// Never fails: an unreachable, unsuccessful or malformed map is recorded
    /// as invalid and yields an empty map. Addresses in a good map are
    /// resolved against the URL it was served from.
    pub async fn fetch_external_map(&self, url: &str) -> ResolutionMap {
        let Some(resolved) = self.resolve(url) else {
            warn!(url, "External map URL cannot be resolved");
            self.mark_invalid(url);
            return map::create_empty();
        };

        let key = resolved.to_string();
        self.cache
            .cell(&key)
            .get_or_init(|| async {
                debug!(url = %resolved, "Fetching external map");
                match retrieve_map(self.retriever.as_ref(), &resolved).await {
                    Some((map, served_from)) => map::rebase(&map, &served_from),
                    None => {
                        self.mark_invalid(&key);
                        map::create_empty()
                    },
                }
            })
            .await
            .clone()
    }

    /// Merges the given external maps left to right.
    pub async fn get_external_override_map(&self, urls: &[String]) -> ResolutionMap {
        let mut merged = map::create_empty();
        for url in urls {
            let fetched = self.fetch_external_map(url).await;
            merged = map::merge(&merged, &fetched);
        }
        merged
    }

    /// Merges every persisted external map, in sorted order.
    pub async fn get_all_external_override_map(&self) -> Result<ResolutionMap, EngineError> {
        let urls = self.get_external_overrides()?;
        Ok(self.get_external_override_map(&urls).await)
    }

    /// Waits for the fetch of `url`, then reports whether it succeeded.
    pub async fn is_external_map_valid(&self, url: &str) -> bool {
        self.fetch_external_map(url).await;
        let key = self.resolve(url).map_or_else(|| url.to_owned(), String::from);
        !self.invalid.lock().contains(&key)
    }

    /// URLs whose fetch failed, in the order they failed.
    #[must_use]
    pub fn invalid_external_maps(&self) -> Vec<String> {
        self.invalid.lock().clone()
    }

    #[must_use]
    pub fn fetch_state(&self, url: &str) -> FetchState {
        let key = self.resolve(url).map_or_else(|| url.to_owned(), String::from);
        if self.invalid.lock().contains(&key) {
            return FetchState::Invalid;
        }
        match self.cache.peek(&key) {
            None => FetchState::Unfetched,
            Some(cell) if cell.initialized() => FetchState::Valid,
            Some(_) => FetchState::Fetching,
        }
    }

    fn resolve(&self, url: &str) -> Option<Url> {
        self.base.join(url).ok()
    }

    fn mark_invalid(&self, url: &str) {
        let mut invalid = self.invalid.lock();
        if !invalid.iter().any(|u| u == url) {
            invalid.push(url.to_owned());
        }
    }

    fn read_urls(&self) -> Result<Vec<String>, EngineError> {
        let Some(raw) = self.store.get(EXTERNAL_MAPS_KEY)? else {
            return Ok(Vec::new());
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key = EXTERNAL_MAPS_KEY, error = %e, "Ignoring unreadable external map list");
            Vec::new()
        }))
    }

    fn write_urls(&self, urls: &[String]) -> Result<(), EngineError> {
        let encoded = serde_json::to_string(urls)?;
        self.store.set(EXTERNAL_MAPS_KEY, &encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::Retrieved;
    use async_trait::async_trait;
    use imo_event_bus::{EventBus, ManualQueue};
    use imo_storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct SlowRetriever {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Retriever for SlowRetriever {
        async fn retrieve(&self, url: &Url) -> Result<Retrieved, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            match url.path() {
                "/good.json" => Ok(Retrieved::success(url.clone(), r#"{"imports":{"a":"./a.js"}}"#)),
                "/missing.json" => Ok(Retrieved::status(404)),
                "/garbage.json" => Ok(Retrieved::success(url.clone(), "<html>")),
                _ => Err(EngineError::Retrieval { message: "connection refused".into(), context: None }),
            }
        }
    }

    fn registry() -> (ExternalMapRegistry, Arc<SlowRetriever>, MemoryStore) {
        let memory = MemoryStore::new();
        let retriever = Arc::new(SlowRetriever::default());
        let changes = ChangeBus::new(EventBus::new(), Arc::new(ManualQueue::new()));
        let base = Url::parse("https://app.test/shell/index.html").unwrap();
        let registry =
            ExternalMapRegistry::new(Arc::new(memory.clone()), retriever.clone(), base, changes);
        (registry, retriever, memory)
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_retrieval() {
        let (registry, retriever, _) = registry();
        let url = "https://maps.test/good.json";

        assert_eq!(registry.fetch_state(url), FetchState::Unfetched);
        let (first, second) = tokio::join!(registry.fetch_external_map(url), registry.fetch_external_map(url));

        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(first.get("a"), Some("https://maps.test/a.js"));
        assert_eq!(registry.fetch_state(url), FetchState::Valid);

        registry.fetch_external_map(url).await;
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_recorded_and_empty() {
        let (registry, _, _) = registry();
        let urls = [
            "https://maps.test/missing.json".to_owned(),
            "https://maps.test/garbage.json".to_owned(),
            "https://down.test/offline.json".to_owned(),
        ];

        for url in &urls {
            assert!(!registry.is_external_map_valid(url).await);
            assert_eq!(registry.fetch_state(url), FetchState::Invalid);
        }
        assert_eq!(registry.get_external_override_map(&urls).await, map::create_empty());
        assert_eq!(registry.invalid_external_maps(), urls.to_vec());
    }

    #[tokio::test]
    async fn test_relative_url_is_fetched_from_base() {
        let (registry, retriever, _) = registry();
        let fetched = registry.fetch_external_map("/good.json").await;

        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetched.get("a"), Some("https://app.test/a.js"));
        assert_eq!(registry.fetch_state("https://app.test/good.json"), FetchState::Valid);
        assert!(registry.is_external_map_valid("../good.json").await);
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_resolves_and_deduplicates() {
        let (registry, _, memory) = registry();

        assert!(registry.add_external_override("maps/z.json").unwrap());
        assert!(registry.add_external_override("https://maps.test/a.json").unwrap());
        assert!(!registry.add_external_override("/shell/maps/z.json").unwrap());

        assert_eq!(
            registry.get_external_overrides().unwrap(),
            vec!["https://app.test/shell/maps/z.json".to_owned(), "https://maps.test/a.json".to_owned()]
        );
        assert_eq!(
            memory.get(EXTERNAL_MAPS_KEY).unwrap().as_deref(),
            Some(r#"["https://app.test/shell/maps/z.json","https://maps.test/a.json"]"#)
        );

        assert!(registry.remove_external_override("maps/z.json").unwrap());
        assert!(!registry.remove_external_override("maps/z.json").unwrap());
        assert_eq!(registry.get_external_overrides().unwrap().len(), 1);
    }
}
