// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure propagation: retries, dependency skips, partial completion.

use crate::prelude::*;
use herd_core::{FakeClock, ScheduleStatus, TaskId, TaskStatus};
use herd_engine::{
    BridgeStatus, ExecutionBridge, FakeTaskSpawner, ModelSelector, ModelSelectorConfig,
    MAX_TASK_RETRIES, TASK_RETRY_DELAY,
};
use herd_engine::spawner::FakeBehaviour;
use std::sync::Arc;

fn bridge(clock: &FakeClock, spawner: &FakeTaskSpawner) -> ExecutionBridge<FakeClock> {
    ExecutionBridge::new(
        clock.clone(),
        Arc::new(spawner.clone()),
        ModelSelector::new(ModelSelectorConfig::default()),
    )
}

/// A task that keeps failing is retried with backoff, then fails for
/// good; tasks depending on it are skipped, independent work completes,
/// and the run ends partial.
#[tokio::test]
async fn retries_exhaust_then_dependents_skip() {
    let clock = clock();
    let spawner = FakeTaskSpawner::completing();
    spawner.set_behaviour(&TaskId::new("flaky"), FakeBehaviour::FailImmediately);
    let bridge = bridge(&clock, &spawner);

    bridge
        .load_plan(vec![
            item("flaky", 0, &[]),
            item("downstream", 0, &["flaky"]),
            item("independent", 0, &[]),
        ])
        .unwrap();
    bridge.start().unwrap();

    for _ in 0..40 {
        bridge.tick().await;
        if bridge.status().is_terminal() {
            break;
        }
        clock.advance(TASK_RETRY_DELAY);
    }

    assert_eq!(bridge.status(), BridgeStatus::Partial);

    let schedule = bridge.schedule().unwrap();
    assert_eq!(schedule.status, ScheduleStatus::Partial);
    let group = schedule.group(0).unwrap();
    assert_eq!(
        group.task(&TaskId::new("flaky")).unwrap().status,
        TaskStatus::Failed
    );
    assert_eq!(
        group.task(&TaskId::new("downstream")).unwrap().status,
        TaskStatus::Skipped
    );
    assert_eq!(
        group.task(&TaskId::new("independent")).unwrap().status,
        TaskStatus::Completed
    );

    // The flaky task was attempted exactly the retry budget
    let attempts = spawner
        .assignments()
        .iter()
        .filter(|a| a.task_id == TaskId::new("flaky"))
        .count();
    assert_eq!(attempts, MAX_TASK_RETRIES as usize);
}

/// A fully failed group blocks dependent groups from ever starting,
/// while groups with partial results let execution continue.
#[tokio::test]
async fn partial_groups_unblock_failed_groups_block() {
    let clock = clock();
    let spawner = FakeTaskSpawner::completing();
    spawner.set_behaviour(&TaskId::new("bad"), FakeBehaviour::FailImmediately);
    let bridge = bridge(&clock, &spawner);

    bridge
        .load_plan(vec![
            item("good", 0, &[]),
            item("bad", 0, &[]),
            item("next", 1, &["good"]),
        ])
        .unwrap();
    bridge.start().unwrap();

    for _ in 0..40 {
        bridge.tick().await;
        if bridge.status().is_terminal() {
            break;
        }
        clock.advance(TASK_RETRY_DELAY);
    }

    // Group 0 is partial (good completed), so group 1 still ran
    let schedule = bridge.schedule().unwrap();
    assert_eq!(
        schedule.group(1).unwrap().task(&TaskId::new("next")).unwrap().status,
        TaskStatus::Completed
    );
    assert_eq!(bridge.status(), BridgeStatus::Partial);
}
