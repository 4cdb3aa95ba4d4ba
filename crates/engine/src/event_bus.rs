// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process publish/subscribe for lifecycle events.
//!
//! Dispatch is synchronous and fire-and-forget: every matching listener is
//! called in subscription order on the emitting task. A listener that returns
//! an error or panics is logged and skipped; the engine never sees it.

use fj_core::FleetEvent;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Error type listeners may return.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Listener = Arc<dyn Fn(&FleetEvent) -> Result<(), ListenerError> + Send + Sync>;

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every event
    topic: Option<String>,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one named event (e.g. `"job:created"`).
    pub fn on<F>(&self, event_name: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: Fn(&FleetEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.add(Some(event_name.into()), Arc::new(listener))
    }

    /// Subscribe to every event.
    pub fn on_any<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&FleetEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.add(None, Arc::new(listener))
    }

    /// Forward every event into an unbounded channel.
    ///
    /// Call [`EventBus::off`] with the returned id once the receiver is dropped.
    pub fn channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<FleetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.on_any(move |event| {
            tx.send(event.clone())
                .map_err(|_| ListenerError::from("event receiver dropped"))
        });
        (id, rx)
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.write();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    pub fn emit(&self, event: &FleetEvent) {
        let name = event.name();
        // Snapshot so listeners may subscribe or unsubscribe during dispatch
        let listeners: Vec<(SubscriptionId, Listener)> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.topic.as_deref().map_or(true, |t| t == name))
            .map(|s| (s.id, Arc::clone(&s.listener)))
            .collect();

        for (id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(event = name, subscription = id.0, error = %e, "listener failed")
                }
                Err(_) => tracing::warn!(event = name, subscription = id.0, "listener panicked"),
            }
        }
    }

    fn add(&self, topic: Option<String>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.write().push(Subscription {
            id,
            topic,
            listener,
        });
        id
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
