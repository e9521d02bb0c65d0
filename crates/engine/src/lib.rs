//! # Import Map Overrides
//!
//! Layers persisted, per-specifier overrides and remotely hosted override
//! maps on top of the module resolution maps a page declares.
//!
//! The engine is built once per page load by [`ImportMapOverrides::boot`]
//! from injected collaborators ([`Host`]): a synchronous
//! [`KeyValueStore`](imo_storage::KeyValueStore), an async [`Retriever`], the
//! page's [`Document`] and a [`TaskQueue`](imo_event_bus::TaskQueue) for
//! deferred notifications.
//!
//! ## Views
//!
//! * **default map**: every page-authored source merged in document order.
//! * **current page map**: default, then the external maps and overrides this load started with.
//! * **next page map**: default, then every persisted external map and the live overrides.
//!
//! ## Example
//!
//! ```rust
//! use imo_engine::*;
//! use imo_event_bus::ManualQueue;
//! use imo_storage::MemoryStore;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl Retriever for Offline {
//!     async fn retrieve(&self, _: &url::Url) -> Result<Retrieved, EngineError> {
//!         Ok(Retrieved::status(503))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), EngineError> {
//! let document = MemoryDocument::new(vec![DeclarativeSource::inline(
//!     SourceKind::Importmap,
//!     r#"{"imports":{"app":"/app.js"}}"#,
//! )]);
//! let host = Host::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(Offline),
//!     Arc::new(document),
//!     Arc::new(ManualQueue::new()),
//! );
//!
//! let engine = ImportMapOverrides::boot(&EngineConfig::default(), host)?.into_active().unwrap();
//! engine.overrides().add_override("app", "9000")?;
//!
//! let next = engine.get_next_page_map().await?;
//! assert_eq!(next.get("app"), Some("//localhost:9000/app.js"));
//! # Ok(())
//! # }
//! ```

mod config;
mod default_map;
mod dev_libs;
mod document;
mod engine;
mod error;
mod events;
mod external;
mod gate;
mod map;
mod mirror;
mod overrides;
mod page_map;
mod retrieve;

pub use config::{EngineConfig, MapType, PageConfig, load_config};
pub use default_map::DefaultMapResolver;
pub use dev_libs::{dev_lib_url, is_dev_lib, overrides_besides_dev_libs};
pub use document::{
    DeclarativeSource, Document, EXTERNAL_SOURCE_ID_PREFIX, MemoryDocument, OVERRIDE_SOURCE_ID, SourceContent,
    SourceKind, current_page_external_overrides,
};
pub use engine::{EngineInfo, Host, ImportMapOverrides, Startup};
pub use error::{EngineError, EngineErrorExt};
pub use events::{ChangeBus, ImoEvent};
pub use external::{EXTERNAL_MAPS_KEY, ExternalMapRegistry, FetchState};
pub use gate::DomainGate;
pub use map::{ResolutionMap, SpecifierMap, create_empty, merge, merge_all, rebase};
pub use mirror::{MirrorSink, RecordingSink, apply_overrides, parse_overrides_from_mirror};
pub use overrides::{DISABLED_KEY, OVERRIDE_PREFIX, OverrideStore, url_from_port};
pub use page_map::PageMapResolver;
pub use retrieve::{Retrieved, Retriever};
