//! Dependency-injected event bus.
//!
//! The registry is populated during startup wiring and only read during
//! dispatch. Handlers for one aggregate's events run sequentially in
//! registration order; a failing or slow handler is logged and skipped,
//! never propagated to the caller that committed the state change.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::{DomainEvent, EventKind};

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
    handler_timeout: Duration,
}

impl EventBus {
    pub fn new(handler_timeout: Duration) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            handler_timeout,
        }
    }

    /// Append a handler for an event kind. Duplicate registrations fan
    /// out to another handler, they do not replace.
    pub fn register(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().unwrap();
        handlers.entry(kind).or_default().push(handler);
    }

    /// Subscribe one handler to every event kind.
    pub fn register_all(&self, handler: Arc<dyn EventHandler>) {
        for kind in EventKind::ALL {
            self.register(kind, handler.clone());
        }
    }

    /// Invoke every handler registered for each event, in recording
    /// order, sequentially. Individual handler errors and timeouts are
    /// logged and swallowed so one failing side effect never blocks the
    /// rest.
    pub async fn dispatch(&self, events: Vec<DomainEvent>) {
        for event in events {
            let kind = event.kind();
            let subscribed = {
                let handlers = self.handlers.read().unwrap();
                handlers.get(&kind).cloned().unwrap_or_default()
            };

            if tracing::enabled!(tracing::Level::DEBUG) {
                if let Ok(payload) = serde_json::to_string(&event) {
                    tracing::debug!(%kind, %payload, "dispatching domain event");
                }
            }

            for handler in subscribed {
                let result =
                    tokio::time::timeout(self.handler_timeout, handler.handle(&event)).await;

                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(
                            handler = handler.name(),
                            %kind,
                            aggregate_id = %event.aggregate_id(),
                            "event handler failed: {:#}",
                            err
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            handler = handler.name(),
                            %kind,
                            aggregate_id = %event.aggregate_id(),
                            "event handler timed out after {:?}",
                            self.handler_timeout
                        );
                    }
                }
            }
        }
    }

    /// Run dispatch on a background task so the committing caller (and
    /// any lock it still holds) is never blocked on side effects.
    pub fn dispatch_background(self: Arc<Self>, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }

        tokio::spawn(async move {
            self.dispatch(events).await;
        });
    }
}
