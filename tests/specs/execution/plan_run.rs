// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end plan execution: schedule, dispatch, completion.

use crate::prelude::*;
use herd_core::{FakeClock, GroupStatus, TaskId};
use herd_engine::{
    BridgeStatus, ExecutionBridge, FakeTaskSpawner, ModelSelector, ModelSelectorConfig,
};
use std::sync::Arc;

fn bridge(clock: &FakeClock, spawner: &FakeTaskSpawner) -> ExecutionBridge<FakeClock> {
    ExecutionBridge::new(
        clock.clone(),
        Arc::new(spawner.clone()),
        ModelSelector::new(ModelSelectorConfig::default()),
    )
}

async fn run_to_terminal(bridge: &ExecutionBridge<FakeClock>) {
    for _ in 0..50 {
        bridge.tick().await;
        if bridge.status().is_terminal() {
            return;
        }
    }
    panic!("execution did not settle");
}

/// A dependency-ordered plan runs group by group; every task completes
/// only after its dependencies, and the history records the execution.
#[tokio::test]
async fn dependency_ordered_plan_completes() {
    let clock = clock();
    let spawner = FakeTaskSpawner::completing();
    let bridge = bridge(&clock, &spawner);

    bridge
        .load_plan(vec![
            item("parse", 0, &[]),
            item("analyze", 0, &["parse"]),
            item("report", 1, &["analyze"]),
        ])
        .unwrap();
    bridge.start().unwrap();
    run_to_terminal(&bridge).await;

    assert_eq!(bridge.status(), BridgeStatus::Completed);

    let schedule = bridge.schedule().unwrap();
    assert_eq!(schedule.completed_tasks, 3);
    assert!(schedule
        .groups
        .iter()
        .all(|g| g.status == GroupStatus::Completed));

    // Dependency edges respected: completion precedes dependent start
    for group in &schedule.groups {
        for task in &group.tasks {
            for dep in &task.item.dependencies {
                let dep_task = schedule
                    .groups
                    .iter()
                    .find_map(|g| g.task(dep))
                    .unwrap();
                assert!(dep_task.completed_at_ms.unwrap() <= task.started_at_ms.unwrap());
            }
        }
    }

    let history = bridge.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, BridgeStatus::Completed);
}

/// Model selection is per task: heavyweight work gets the deep model,
/// small exploration gets the fast one.
#[tokio::test]
async fn models_follow_task_hints() {
    let clock = clock();
    let spawner = FakeTaskSpawner::completing();
    let bridge = bridge(&clock, &spawner);

    let mut heavy = item("heavy", 0, &[]);
    heavy.estimated_tokens = Some(80_000);
    let light = item("light", 0, &[]);

    bridge.load_plan(vec![heavy, light]).unwrap();
    bridge.start().unwrap();
    run_to_terminal(&bridge).await;

    let model_of = |id: &str| {
        spawner
            .assignments()
            .iter()
            .find(|a| a.task_id == TaskId::new(id))
            .unwrap()
            .model
            .model
            .clone()
    };
    assert_eq!(model_of("heavy"), "opus");
    assert_eq!(model_of("light"), "haiku");
}
