//! # Event Bus
//!
//! Typed fan-out events plus deferred, coalescing notification.
//!
//! ## Overview
//!
//! [`EventBus`] keeps one `tokio::sync::broadcast` channel per event type.
//! [`Notifier`] sits on top of it and delivers events on a later tick of a
//! [`TaskQueue`], collapsing identical requests made in the same tick.
//!
//! # Example
//!
//! ```rust
//! use imo_event_bus::{EventBus, EventReceiverExt, ManualQueue, Notifier};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, PartialEq, Eq, Hash)]
//! enum Changed { Overrides }
//!
//! let bus = EventBus::new();
//! let queue = ManualQueue::new();
//! let notifier = Notifier::new(bus.clone(), Arc::new(queue.clone()));
//!
//! let mut rx = bus.subscribe::<Changed>().unwrap();
//! notifier.notify(Changed::Overrides);
//! notifier.notify(Changed::Overrides);
//! queue.run_pending();
//!
//! assert!(rx.try_next().is_some());
//! assert!(rx.try_next().is_none());
//! ```

mod bus;
mod error;
mod notifier;
mod queue;
mod receiver;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use notifier::Notifier;
pub use queue::{ManualQueue, Task, TaskQueue, TokioQueue};
pub use receiver::EventReceiverExt;
