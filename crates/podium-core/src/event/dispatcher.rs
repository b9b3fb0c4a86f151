//! In-process publish/subscribe bus.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use super::model::{Event, EventKind};
use crate::error::Result;

/// A consumer of published events.
///
/// `handle` runs on the publisher's thread and must not block. Long-running
/// work belongs in a task spawned from the handler. The dispatcher is passed
/// in so handlers can publish follow-up events without holding a reference
/// to it.
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &str;

    fn handle(&self, event: &Event, dispatcher: &Arc<EventDispatcher>) -> Result<()>;
}

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Topic-keyed handler registry.
///
/// Handlers for a topic run in registration order. A failing or panicking
/// handler is logged and skipped; the rest still run.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(topic = %kind, handler = handler.name(), "Subscribing handler");
        handlers.entry(kind).or_default().push(handler);
    }

    /// Subscribes `handler` to every topic.
    pub fn subscribe_all(&self, handler: Arc<dyn EventHandler>) {
        for kind in EventKind::ALL {
            self.subscribe(kind, Arc::clone(&handler));
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Invokes every handler subscribed to the event's topic.
    ///
    /// Returns once each handler's synchronous part has run; work a handler
    /// spawns may still be in flight.
    pub fn publish(self: &Arc<Self>, event: Event) -> PublishReport {
        let kind = event.kind();
        // Snapshot so handlers may publish or subscribe re-entrantly.
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let guard = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            guard.get(&kind).cloned().unwrap_or_default()
        };

        let mut report = PublishReport::default();
        for handler in handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(&event, self)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::warn!(
                        topic = %kind,
                        handler = handler.name(),
                        room_id = event.room_id(),
                        "Event handler failed: {}",
                        err
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::warn!(
                        topic = %kind,
                        handler = handler.name(),
                        room_id = event.room_id(),
                        "Event handler panicked"
                    );
                }
            }
        }
        report
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = handlers
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.len()))
            .collect();
        f.debug_struct("EventDispatcher").field("handlers", &counts).finish()
    }
}
