use crate::document::{Document, SourceContent, SourceKind, default_sources};
use crate::error::EngineError;
use crate::map::{self, ResolutionMap};
use crate::retrieve::{Retriever, retrieve_map};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

/// Merges the page's own map sources into the default map, once.
#[derive(Debug)]
pub struct DefaultMapResolver {
    document: Arc<dyn Document>,
    retriever: Arc<dyn Retriever>,
    base: Url,
    kind: SourceKind,
    resolved: OnceCell<ResolutionMap>,
}

impl DefaultMapResolver {
    pub fn new(document: Arc<dyn Document>, retriever: Arc<dyn Retriever>, base: Url, kind: SourceKind) -> Self {
        Self { document, retriever, base, kind, resolved: OnceCell::new() }
    }

    /// Every page-authored source of the configured kind (and the overridable
    /// map), merged in document order.
    ///
    /// Empty sources and sources that fail to load or parse count as empty.
    /// Only a malformed overridable map fails the call; a failed attempt is not memoized.
    pub async fn get_default_map(&self) -> Result<ResolutionMap, EngineError> {
        self.resolved.get_or_try_init(|| self.scan()).await.cloned()
    }

    async fn scan(&self) -> Result<ResolutionMap, EngineError> {
        let sources = self.document.sources();
        let mut merged = map::create_empty();

        for (position, source) in default_sources(&sources, self.kind).enumerate() {
            let fragment = match &source.content {
                SourceContent::Inline(text) if text.trim().is_empty() => map::create_empty(),
                SourceContent::Inline(text) => match ResolutionMap::parse(text) {
                    Ok(parsed) => parsed,
                    Err(e) if source.kind == SourceKind::OverridableImportmap => {
                        return Err(EngineError::Configuration {
                            message: format!("overridable-importmap content must be JSON: {e}").into(),
                            context: source.id.clone().map(Into::into),
                        });
                    },
                    Err(e) => {
                        warn!(position, kind = ?source.kind, error = %e, "Skipping inline map source that is not valid JSON");
                        map::create_empty()
                    },
                },
                SourceContent::Reference(reference) => match self.base.join(reference) {
                    Ok(url) => retrieve_map(self.retriever.as_ref(), &url).await.map(|(map, _)| map).unwrap_or_default(),
                    Err(e) => {
                        warn!(reference = %reference, error = %e, "Skipping map source with an unresolvable URL");
                        map::create_empty()
                    },
                },
            };
            merged = map::merge(&merged, &fragment);
        }

        debug!(imports = merged.imports.len(), scopes = merged.scopes.len(), "Default map resolved");
        Ok(merged)
    }
}
