//! Event publication port.
//!
//! Publication is fire-and-forget: the call returns before any subscriber
//! has run, so callers can never be stalled by a slow consumer.

use scenehub_domain::event::Event;

/// Publishes domain events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers without waiting for any
    /// of them.
    fn publish(&self, event: Event);
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) {
        (**self).publish(event);
    }
}
