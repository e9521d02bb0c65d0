use std::borrow::Cow;

/// Errors surfaced by the resolution engine.
///
/// Only [`EngineError::Configuration`] aborts a boot. Retrieval problems are
/// recovered inside the engine and only appear here when a [`Retriever`](crate::Retriever)
/// reports them.
#[imo_derive::imo_error]
pub enum EngineError {
    /// The page declares its maps in a way the engine cannot work with.
    #[error("Configuration error{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage error{}: {source}", format_context(.context))]
    Storage { source: imo_storage::StorageError, context: Option<Cow<'static, str>> },

    /// The transport could not produce a response at all.
    #[error("Retrieval failed{}: {message}", format_context(.context))]
    Retrieval { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Malformed map{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Event bus error{}: {source}", format_context(.context))]
    Events { source: imo_event_bus::EventBusError, context: Option<Cow<'static, str>> },

    #[error("Internal engine error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
