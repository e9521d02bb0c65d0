//! # imo-inspect
//!
//! Command-line host for the import map override engine. A page is described
//! as JSON (location plus declarative map sources), overrides persist in a
//! [`FileStore`](imo_storage::FileStore) snapshot and referenced maps are read
//! from `file://` URLs.
//!
//! ```text
//! imo-inspect --page page.json override add react 8080
//! imo-inspect --page page.json next
//! ```

pub mod args;
pub mod commands;
pub mod config;
pub mod mirror;
pub mod page;
pub mod retriever;

pub use args::Cli;
pub use commands::execute;
pub use config::InspectConfig;
pub use page::PageDescription;
pub use retriever::FsRetriever;
