use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[imo_derive::imo_error]
pub enum StorageError {
    /// The backing store refused access (disabled by the host, read-only medium, ...).
    #[error("Store unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Snapshot encoding failure{}: {source}", format_context(.context))]
    Snapshot { source: serde_json::Error, context: Option<Cow<'static, str>> },
}
