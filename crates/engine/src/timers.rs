// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tick-polled timer wheel.
//!
//! The bridge polls this on every tick instead of arming one tokio timer
//! per deadline; deadlines are compared against the injected clock so
//! tests drive time explicitly.

use herd_core::TimerId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Timer entry
#[derive(Debug, Clone)]
struct Timer {
    fires_at: Instant,
}

/// Manages timers for the bridge
#[derive(Debug, Default)]
pub struct TimerWheel {
    timers: HashMap<TimerId, Timer>,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or reset) a timer
    pub fn set(&mut self, id: TimerId, duration: Duration, now: Instant) {
        let fires_at = now + duration;
        self.timers.insert(id, Timer { fires_at });
    }

    /// Cancel a timer
    pub fn cancel(&mut self, id: &TimerId) {
        self.timers.remove(id);
    }

    /// Cancel all timers
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Remove and return all timers that have fired
    pub fn fired(&mut self, now: Instant) -> Vec<TimerId> {
        let fired: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, t)| t.fires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &fired {
            self.timers.remove(id);
        }
        fired
    }

    /// Check if there are any pending timers
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;
