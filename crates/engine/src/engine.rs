use crate::config::{EngineConfig, MapType};
use crate::default_map::DefaultMapResolver;
use crate::dev_libs;
use crate::document::{
    self, DeclarativeSource, Document, EXTERNAL_SOURCE_ID_PREFIX, OVERRIDE_SOURCE_ID, SourceContent, SourceKind,
};
use crate::error::EngineError;
use crate::events::{ChangeBus, ImoEvent};
use crate::external::ExternalMapRegistry;
use crate::map::{self, ResolutionMap, SpecifierMap};
use crate::mirror::MirrorSink;
use crate::overrides::OverrideStore;
use crate::page_map::PageMapResolver;
use crate::retrieve::Retriever;
use imo_event_bus::{EventBus, TaskQueue};
use imo_storage::KeyValueStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

/// Everything the engine borrows from its host.
#[derive(Debug, Clone)]
pub struct Host {
    pub store: Arc<dyn KeyValueStore>,
    pub retriever: Arc<dyn Retriever>,
    pub document: Arc<dyn Document>,
    pub queue: Arc<dyn TaskQueue>,
    pub mirror: Option<Arc<dyn MirrorSink>>,
    pub bus: EventBus,
}

impl Host {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        retriever: Arc<dyn Retriever>,
        document: Arc<dyn Document>,
        queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self { store, retriever, document, queue, mirror: None, bus: EventBus::new() }
    }

    /// Receives override records when the map type is `server`.
    #[must_use]
    pub fn with_mirror(mut self, mirror: Arc<dyn MirrorSink>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }
}

/// Static facts about an engine, available even when it did not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub map_type: MapType,
    pub disabled: bool,
    pub query_param_overrides_name: String,
}

/// Outcome of [`ImportMapOverrides::boot`].
#[derive(Debug)]
pub enum Startup {
    Active(ImportMapOverrides),
    /// Gated off by hostname or by an unusable store.
    Inactive(EngineInfo),
}

impl Startup {
    #[must_use]
    pub fn info(&self) -> EngineInfo {
        match self {
            Self::Active(engine) => engine.info(),
            Self::Inactive(info) => info.clone(),
        }
    }

    #[must_use]
    pub fn into_active(self) -> Option<ImportMapOverrides> {
        match self {
            Self::Active(engine) => Some(engine),
            Self::Inactive(_) => None,
        }
    }
}

/// A running override engine for one page load.
#[derive(Debug)]
pub struct ImportMapOverrides {
    map_type: MapType,
    query_param: String,
    changes: ChangeBus,
    overrides: OverrideStore,
    externals: Arc<ExternalMapRegistry>,
    defaults: Arc<DefaultMapResolver>,
    pages: PageMapResolver,
}

impl ImportMapOverrides {
    /// Starts the engine for the page described by `config`.
    ///
    /// Returns [`Startup::Inactive`] when the hostname is gated off or the
    /// store rejects a probe write. Unless the map type is `server`, the
    /// persisted overrides and external maps are written into the document.
    /// An `Init` event follows on the next queue tick.
    ///
    /// # Errors
    /// [`EngineError::Configuration`] for a bad page location or base, or an
    /// overridable map that is referenced by URL or is not valid JSON. The
    /// document is left untouched in those cases.
    pub fn boot(config: &EngineConfig, host: Host) -> Result<Startup, EngineError> {
        let inactive = || EngineInfo {
            map_type: config.map_type,
            disabled: true,
            query_param_overrides_name: config.query_param.clone(),
        };

        let location = config.page.location_url()?;
        let hostname = location.host_str().unwrap_or_default();
        if !config.domains.allows(hostname) {
            info!(hostname, "Import map overrides disabled for this domain");
            return Ok(Startup::Inactive(inactive()));
        }

        if let Err(e) = host.store.probe() {
            warn!(error = %e, "Persistent store is not accessible; import map overrides disabled");
            return Ok(Startup::Inactive(inactive()));
        }

        let base = config.page.base()?;
        let kind = config.map_type.source_kind();
        let changes = ChangeBus::new(host.bus, host.queue);

        let mut overrides = OverrideStore::new(Arc::clone(&host.store), changes.clone())
            .with_query_overrides(query_overrides(&location, &config.query_param));
        if config.map_type.is_server() {
            match host.mirror {
                Some(mirror) => overrides = overrides.with_mirror(mirror),
                None => debug!("Server map type without a mirror sink; overrides stay local"),
            }
        }

        let externals = Arc::new(ExternalMapRegistry::new(
            Arc::clone(&host.store),
            Arc::clone(&host.retriever),
            base.clone(),
            changes.clone(),
        ));

        let initial_overrides = overrides.get_override_map(false)?;
        if !config.map_type.is_server() {
            inject(host.document.as_ref(), kind, &initial_overrides, &externals.get_external_overrides()?)?;
        }
        let initial_externals = document::current_page_external_overrides(&host.document.sources(), kind);

        let defaults = Arc::new(DefaultMapResolver::new(host.document, host.retriever, base, kind));
        let pages = PageMapResolver::new(
            Arc::clone(&defaults),
            Arc::clone(&externals),
            overrides.clone(),
            initial_overrides,
            initial_externals,
        );

        changes.init();
        info!(map_type = ?config.map_type, hostname, "Import map overrides active");

        Ok(Startup::Active(Self {
            map_type: config.map_type,
            query_param: config.query_param.clone(),
            changes,
            overrides,
            externals,
            defaults,
            pages,
        }))
    }

    #[must_use]
    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            map_type: self.map_type,
            disabled: false,
            query_param_overrides_name: self.query_param.clone(),
        }
    }

    /// Receives `Init` and `Change` notifications.
    pub fn subscribe(&self) -> Result<broadcast::Receiver<Arc<ImoEvent>>, EngineError> {
        self.changes.subscribe()
    }

    #[must_use]
    pub const fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    #[must_use]
    pub fn external_maps(&self) -> &ExternalMapRegistry {
        &self.externals
    }

    pub async fn get_default_map(&self) -> Result<ResolutionMap, EngineError> {
        self.defaults.get_default_map().await
    }

    pub async fn get_current_page_map(&self) -> Result<ResolutionMap, EngineError> {
        self.pages.get_current_page_map().await
    }

    pub async fn get_next_page_map(&self) -> Result<ResolutionMap, EngineError> {
        self.pages.get_next_page_map().await
    }

    #[must_use]
    pub fn current_page_external_overrides(&self) -> &[String] {
        self.pages.current_page_external_overrides()
    }

    /// Active overrides as they were when this load started.
    #[must_use]
    pub const fn initial_override_map(&self) -> &ResolutionMap {
        self.pages.initial_override_map()
    }

    /// Overrides every known library in the current page map with its development build.
    ///
    /// Returns the specifiers that were overridden.
    pub async fn add_dev_lib_overrides(&self) -> Result<Vec<String>, EngineError> {
        let current = self.get_current_page_map().await?;
        let mut added = Vec::new();
        for (specifier, url) in &current.imports {
            if let Some(dev_url) = dev_libs::dev_lib_url(specifier, url) {
                self.overrides.add_override(specifier, &dev_url)?;
                added.push(specifier.clone());
            }
        }
        Ok(added)
    }

    /// Whether any active override is something other than a dev-library swap.
    pub fn overrides_besides_dev_libs(&self) -> Result<bool, EngineError> {
        Ok(dev_libs::overrides_besides_dev_libs(&self.overrides.get_override_map(false)?))
    }
}

/// Reads ad-hoc overrides from the page URL's query string.
fn query_overrides(location: &Url, param: &str) -> SpecifierMap {
    let Some((_, raw)) = location.query_pairs().find(|(name, _)| name == param) else {
        return SpecifierMap::new();
    };

    match ResolutionMap::parse(&raw) {
        Ok(map) => map.imports,
        Err(e) => {
            warn!(param, error = %e, "Ignoring query parameter overrides that are not a valid import map");
            SpecifierMap::new()
        },
    }
}

/// Writes the override artifacts into the document.
///
/// Validation happens before the first insertion so a failure leaves the document as it was.
fn inject(
    document: &dyn Document,
    kind: SourceKind,
    initial_overrides: &ResolutionMap,
    external_urls: &[String],
) -> Result<(), EngineError> {
    let sources = document.sources();

    let (mut anchor, rewritten) = match document::overridable(&sources) {
        Some(index) => {
            let SourceContent::Inline(text) = &sources[index].content else {
                return Err(EngineError::Configuration {
                    message: "overridable-importmap must be inline; referencing it by URL is not supported".into(),
                    context: None,
                });
            };
            let original = ResolutionMap::parse(text).map_err(|e| EngineError::Configuration {
                message: format!("overridable-importmap content must be JSON: {e}").into(),
                context: None,
            })?;
            (Some(index), Some(map::merge(&original, initial_overrides)))
        },
        None => (document::last_authored(&sources, kind), None),
    };

    let has_overridable = rewritten.is_some();
    if let Some(merged) = rewritten {
        let source = DeclarativeSource::inline(kind, merged.to_json_pretty()?).into_override(OVERRIDE_SOURCE_ID);
        anchor = Some(document.insert_after(anchor, source));
    }

    for (i, url) in external_urls.iter().enumerate() {
        let source =
            DeclarativeSource::reference(kind, url.clone()).into_override(format!("{EXTERNAL_SOURCE_ID_PREFIX}{i}"));
        anchor = Some(document.insert_after(anchor, source));
    }

    if !has_overridable && !initial_overrides.imports.is_empty() {
        let source =
            DeclarativeSource::inline(kind, initial_overrides.to_json_pretty()?).into_override(OVERRIDE_SOURCE_ID);
        document.insert_after(anchor, source);
    }

    debug!(externals = external_urls.len(), has_overridable, "Override artifacts written to the document");
    Ok(())
}
