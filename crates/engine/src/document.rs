//! The page's declarative map sources, as seen by the engine.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Id of the inline source the engine writes its override map into.
pub const OVERRIDE_SOURCE_ID: &str = "import-map-overrides";
/// Id prefix of the reference sources the engine writes for external maps.
pub const EXTERNAL_SOURCE_ID_PREFIX: &str = "import-map-overrides-external-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Importmap,
    SystemjsImportmap,
    ImportmapShim,
    /// The single authoritative map the engine rewrites with overrides applied.
    OverridableImportmap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceContent {
    /// JSON text embedded in the page.
    Inline(String),
    /// A URL, possibly relative to the document base.
    Reference(String),
}

/// One map fragment embedded in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarativeSource {
    pub kind: SourceKind,
    pub content: SourceContent,
    /// Set on fragments the engine produced itself.
    #[serde(default)]
    pub is_override: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl DeclarativeSource {
    pub fn inline(kind: SourceKind, text: impl Into<String>) -> Self {
        Self { kind, content: SourceContent::Inline(text.into()), is_override: false, id: None }
    }

    pub fn reference(kind: SourceKind, url: impl Into<String>) -> Self {
        Self { kind, content: SourceContent::Reference(url.into()), is_override: false, id: None }
    }

    /// Flags the source as an engine artifact with the given id.
    #[must_use]
    pub fn into_override(mut self, id: impl Into<String>) -> Self {
        self.is_override = true;
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn reference_url(&self) -> Option<&str> {
        match &self.content {
            SourceContent::Reference(url) => Some(url),
            SourceContent::Inline(_) => None,
        }
    }
}

/// Ordered map sources of a page plus the one mutation the engine needs.
pub trait Document: Debug + Send + Sync {
    /// Snapshot of every source, in document order.
    fn sources(&self) -> Vec<DeclarativeSource>;

    /// Inserts `source` right after index `anchor`, or at the end when `anchor`
    /// is `None`. Returns the index it landed at.
    fn insert_after(&self, anchor: Option<usize>, source: DeclarativeSource) -> usize;
}

/// In-process [`Document`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    sources: Arc<RwLock<Vec<DeclarativeSource>>>,
}

impl MemoryDocument {
    #[must_use]
    pub fn new(sources: Vec<DeclarativeSource>) -> Self {
        Self { sources: Arc::new(RwLock::new(sources)) }
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<DeclarativeSource> {
        self.sources.read().iter().find(|s| s.id.as_deref() == Some(id)).cloned()
    }
}

impl Document for MemoryDocument {
    fn sources(&self) -> Vec<DeclarativeSource> {
        self.sources.read().clone()
    }

    fn insert_after(&self, anchor: Option<usize>, source: DeclarativeSource) -> usize {
        let mut sources = self.sources.write();
        let index = anchor.map_or(sources.len(), |i| (i + 1).min(sources.len()));
        sources.insert(index, source);
        index
    }
}

/// Sources that make up the default map: `kind` plus the overridable map, minus engine artifacts.
pub(crate) fn default_sources(sources: &[DeclarativeSource], kind: SourceKind) -> impl Iterator<Item = &DeclarativeSource> {
    sources
        .iter()
        .filter(move |s| !s.is_override && (s.kind == kind || s.kind == SourceKind::OverridableImportmap))
}

/// Index of the last page-authored source of `kind`.
pub(crate) fn last_authored(sources: &[DeclarativeSource], kind: SourceKind) -> Option<usize> {
    sources.iter().rposition(|s| !s.is_override && s.kind == kind)
}

pub(crate) fn overridable(sources: &[DeclarativeSource]) -> Option<usize> {
    sources.iter().position(|s| s.kind == SourceKind::OverridableImportmap && !s.is_override)
}

/// External map references already written into the page, in document order.
#[must_use]
pub fn current_page_external_overrides(sources: &[DeclarativeSource], kind: SourceKind) -> Vec<String> {
    sources
        .iter()
        .filter(|s| s.is_override && s.kind == kind)
        .filter_map(DeclarativeSource::reference_url)
        .map(str::to_owned)
        .collect()
}
