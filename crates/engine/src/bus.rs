// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed event broadcaster.
//!
//! One sender, many receivers, drop-oldest on slow consumers. Components
//! that emit events own a `Broadcaster` and hand out subscriptions;
//! nothing blocks on a receiver that stopped draining.

use tokio::sync::broadcast;

/// Default per-subscriber buffer before the oldest events are dropped.
pub const DEFAULT_CAPACITY: usize = 256;

/// Typed drop-oldest broadcaster.
#[derive(Debug)]
pub struct Broadcaster<T: Clone> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers. Events emitted with no
    /// subscribers are dropped.
    pub fn emit(&self, event: T) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
