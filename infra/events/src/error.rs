use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[imo_derive::imo_error]
pub enum EventBusError {
    /// Occurs when an internal dynamic cast fails.
    /// This usually indicates an invariant violation in the type registry.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Capacity must be greater than zero for broadcast channels.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A Tokio-backed queue was requested outside a runtime.
    #[error("No async runtime{}: {source}", format_context(.context))]
    NoRuntime { source: tokio::runtime::TryCurrentError, context: Option<Cow<'static, str>> },
}
