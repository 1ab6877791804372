// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use herd_core::summary::{SummaryConfig, SummaryEventKind};
use herd_core::{FakeClock, SessionId};

fn shared_tracker(clock: &FakeClock) -> Arc<Mutex<SummaryTracker>> {
    Arc::new(Mutex::new(SummaryTracker::new(
        SessionId::new("sess-1"),
        "main",
        SummaryConfig::default(),
        clock.epoch_ms(),
    )))
}

#[tokio::test]
async fn warns_when_state_held_too_long() {
    let clock = FakeClock::new();
    let tracker = shared_tracker(&clock);
    tracker.lock().record_state_change("watching", clock.epoch_ms());

    let _shutdown = start_stuck_watchdog_with_interval(
        Arc::clone(&tracker),
        clock.clone(),
        Duration::from_millis(10),
    );

    // Nothing yet: held time is under the threshold
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(tracker.lock().stats().warning_count, 0);

    // Jump past the threshold and let the watchdog observe it
    clock.advance(Duration::from_secs(11 * 60));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let tracker = tracker.lock();
    assert_eq!(tracker.stats().warning_count, 1);
    assert!(tracker
        .events()
        .iter()
        .any(|e| e.kind == SummaryEventKind::StateStuck));
}

#[tokio::test]
async fn shutdown_stops_the_loop() {
    let clock = FakeClock::new();
    let tracker = shared_tracker(&clock);
    tracker.lock().record_state_change("watching", clock.epoch_ms());

    let shutdown = start_stuck_watchdog_with_interval(
        Arc::clone(&tracker),
        clock.clone(),
        Duration::from_millis(10),
    );
    let _ = shutdown.send(());
    tokio::time::sleep(Duration::from_millis(30)).await;

    // A stuck state after shutdown is no longer observed
    clock.advance(Duration::from_secs(11 * 60));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(tracker.lock().stats().warning_count, 0);
}
