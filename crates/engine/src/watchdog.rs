// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-stuck watchdog.
//!
//! Periodically asks a session's summary tracker whether the supervisor
//! state has been held too long. The tracker itself stays pure; this is
//! the only place a timer touches it.

use herd_core::summary::STATE_STUCK_CHECK_INTERVAL;
use herd_core::{Clock, SummaryTracker};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Start the watchdog for one tracker. Returns a shutdown sender; the
/// task stops cleanly when it is signalled or dropped.
pub fn start_stuck_watchdog<C: Clock>(
    tracker: Arc<Mutex<SummaryTracker>>,
    clock: C,
) -> oneshot::Sender<()> {
    start_stuck_watchdog_with_interval(tracker, clock, STATE_STUCK_CHECK_INTERVAL)
}

/// Watchdog with a custom check interval (tests run it fast).
pub fn start_stuck_watchdog_with_interval<C: Clock>(
    tracker: Arc<Mutex<SummaryTracker>>,
    clock: C,
    interval: Duration,
) -> oneshot::Sender<()> {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would warn before anything happened
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now_ms = clock.epoch_ms();
                    let warned = tracker.lock().check_state_stuck(now_ms);
                    if let Some(event_id) = warned {
                        tracing::warn!(event_id, "session state appears stuck");
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("stuck watchdog shutting down");
                    break;
                }
            }
        }
    });

    shutdown_tx
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
