use crate::bus::{Event, EventBus};
use crate::queue::TaskQueue;
use fxhash::FxHashSet;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{trace, warn};

/// Publishes events on a [`TaskQueue`] tick instead of inline.
///
/// Identical events requested before their tick fires collapse into one
/// delivery. Once delivered, the same event may be requested again.
#[derive(Debug)]
pub struct Notifier<T: Event + Clone + Eq + Hash> {
    bus: EventBus,
    queue: Arc<dyn TaskQueue>,
    pending: Arc<Mutex<FxHashSet<T>>>,
}

impl<T: Event + Clone + Eq + Hash + std::fmt::Debug> Notifier<T> {
    #[must_use]
    pub fn new(bus: EventBus, queue: Arc<dyn TaskQueue>) -> Self {
        Self { bus, queue, pending: Arc::default() }
    }

    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Requests delivery of `event` on the next tick.
    ///
    /// Returns `false` when an identical event is already waiting.
    pub fn notify(&self, event: T) -> bool {
        if !self.pending.lock().insert(event.clone()) {
            trace!(?event, "Notification coalesced");
            return false;
        }

        let bus = self.bus.clone();
        let pending = Arc::clone(&self.pending);
        self.queue.defer(Box::new(move || {
            pending.lock().remove(&event);
            if let Err(e) = bus.publish(event) {
                warn!(error = %e, "Failed to publish deferred notification");
            }
        }));
        true
    }
}

impl<T: Event + Clone + Eq + Hash> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            queue: Arc::clone(&self.queue),
            pending: Arc::clone(&self.pending),
        }
    }
}
