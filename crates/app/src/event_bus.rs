//! In-process publish/subscribe event bus.
//!
//! `publish` schedules every subscribed handler as an independent tokio
//! task and returns immediately; publisher completion never implies handler
//! completion, and subscriber speed can never back-pressure a publisher.
//! There is no ordering guarantee between handlers of one topic or across
//! topics.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scenehub_domain::error::HubError;
use scenehub_domain::event::{Event, EventType};

use crate::ports::EventPublisher;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HubError>> + Send>>;
type Handler = Arc<dyn Fn(Event) -> HandlerFuture + Send + Sync>;

/// Token identifying one subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Topic-keyed handler registry with fire-and-forget dispatch.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<EventType, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to a topic.
    ///
    /// The returned token cancels exactly this subscription when passed to
    /// [`unsubscribe`](Self::unsubscribe). Handlers run on their own tasks,
    /// so slow or blocking work inside a handler never stalls a publisher.
    pub fn subscribe<F, Fut>(&self, topic: EventType, handler: F) -> HandlerId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HubError>> + Send + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: Handler =
            Arc::new(move |event| -> HandlerFuture { Box::pin(handler(event)) });
        self.lock().entry(topic).or_default().push((id, handler));
        id
    }

    /// Remove a subscription; returns whether it was present.
    pub fn unsubscribe(&self, topic: EventType, id: HandlerId) -> bool {
        let mut handlers = self.lock();
        let Some(registered) = handlers.get_mut(&topic) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|(handler_id, _)| *handler_id != id);
        before != registered.len()
    }

    /// Publish an event to all handlers subscribed to its topic.
    ///
    /// Each handler is spawned as its own task; a handler failure is logged
    /// and dropped, never propagated to the publisher or to sibling
    /// handlers. Publishing to a topic with no subscribers is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn publish(&self, event: Event) {
        let handlers: Vec<Handler> = self
            .lock()
            .get(&event.event_type)
            .map(|registered| registered.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in handlers {
            let event = event.clone();
            let topic = event.event_type;
            tokio::spawn(async move {
                if let Err(err) = (*handler)(event).await {
                    tracing::warn!(%topic, error = %err, "event handler failed");
                }
            });
        }
    }

    /// Topics that currently have at least one subscription.
    #[must_use]
    pub fn topics(&self) -> Vec<EventType> {
        self.lock()
            .iter()
            .filter(|(_, registered)| !registered.is_empty())
            .map(|(topic, _)| *topic)
            .collect()
    }

    /// Number of handlers subscribed to a topic.
    #[must_use]
    pub fn handler_count(&self, topic: EventType) -> usize {
        self.lock().get(&topic).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EventType, Vec<(HandlerId, Handler)>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: Event) {
        EventBus::publish(self, event);
    }
}
