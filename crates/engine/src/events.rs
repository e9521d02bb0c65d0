use imo_event_bus::{EventBus, Notifier, TaskQueue};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::EngineError;

/// Notifications published by an active engine. Subscribers only learn that
/// something happened and re-query the views they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImoEvent {
    /// Fired once, on the tick after activation.
    Init,
    /// Fired on the tick after any mutation of overrides or external maps.
    Change,
}

/// Deferred, per-tick coalescing publisher for [`ImoEvent`].
#[derive(Debug, Clone)]
pub struct ChangeBus {
    notifier: Notifier<ImoEvent>,
}

impl ChangeBus {
    #[must_use]
    pub fn new(bus: EventBus, queue: Arc<dyn TaskQueue>) -> Self {
        Self { notifier: Notifier::new(bus, queue) }
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<Arc<ImoEvent>>, EngineError> {
        Ok(self.notifier.bus().subscribe::<ImoEvent>()?)
    }

    pub(crate) fn init(&self) {
        self.notifier.notify(ImoEvent::Init);
    }

    pub(crate) fn changed(&self) {
        self.notifier.notify(ImoEvent::Change);
    }
}
