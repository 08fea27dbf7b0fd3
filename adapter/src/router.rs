//! Routes a shared runtime feed to per-invocation queues.

use std::collections::HashMap;

use async_channel::Sender;
use tracing::{debug, warn};

use crate::feed::RuntimeEvent;

/// Fans a multiplexed runtime-event source out to invocation queues.
///
/// Runtimes that emit all invocations' events through one stream need them
/// routed to the owning invocation's queue. Delivery to one invocation
/// never blocks on another's queue, and an event that arrives before its
/// invocation registers is parked and flushed on registration — requeued,
/// not dropped.
#[derive(Debug, Default)]
pub struct Router {
    routes: HashMap<String, Sender<RuntimeEvent>>,
    parked: HashMap<String, Vec<RuntimeEvent>>,
}

impl Router {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an invocation currently has a registered queue.
    #[must_use]
    pub fn is_registered(&self, invocation_id: &str) -> bool {
        self.routes.contains_key(invocation_id)
    }

    /// Number of events parked for not-yet-registered invocations.
    #[must_use]
    pub fn parked_count(&self) -> usize {
        self.parked.values().map(Vec::len).sum()
    }

    /// Register an invocation's queue, flushing any parked events to it in
    /// arrival order.
    pub async fn register(&mut self, invocation_id: impl Into<String>, queue: Sender<RuntimeEvent>) {
        let invocation_id = invocation_id.into();
        if let Some(parked) = self.parked.remove(&invocation_id) {
            debug!(
                invocation_id = %invocation_id,
                count = parked.len(),
                "flushing parked events to newly registered invocation"
            );
            for event in parked {
                if queue.send(event).await.is_err() {
                    warn!(
                        invocation_id = %invocation_id,
                        "invocation queue closed while flushing parked events"
                    );
                    return;
                }
            }
        }
        self.routes.insert(invocation_id, queue);
    }

    /// Remove an invocation's queue and discard anything parked for it.
    pub fn deregister(&mut self, invocation_id: &str) {
        self.routes.remove(invocation_id);
        self.parked.remove(invocation_id);
    }

    /// Deliver one event to its owning invocation.
    ///
    /// Unknown invocations park the event; a closed queue (the invocation
    /// finished) drops the event and the route. Neither is an error for the
    /// shared feed — one invocation's state never stalls the others.
    pub async fn route(&mut self, event: RuntimeEvent) {
        let Some(queue) = self.routes.get(&event.invocation_id) else {
            debug!(
                invocation_id = %event.invocation_id,
                "parking event for unregistered invocation"
            );
            self.parked
                .entry(event.invocation_id.clone())
                .or_default()
                .push(event);
            return;
        };

        let invocation_id = event.invocation_id.clone();
        if queue.send(event).await.is_err() {
            warn!(
                invocation_id = %invocation_id,
                "invocation queue closed; dropping event and route"
            );
            self.routes.remove(&invocation_id);
        }
    }
}
