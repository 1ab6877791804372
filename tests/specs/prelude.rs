// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.
//!
//! Everything runs in-process: fake session adapter, fake clock, fast
//! polling. No tmux, no assistant binary.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use herd_adapters::{FakeSessionAdapter, ProbeRunner, ProbeRunnerConfig, SessionCall};
use herd_core::{FakeClock, PlanItem, TaskId};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fast poll interval for probe and spawn loops in specs.
pub const SPEC_POLL: Duration = Duration::from_millis(10);

/// A probe runner polling fast enough for specs.
pub fn fast_probe(
    sessions: &FakeSessionAdapter,
    temp_dir: &Path,
) -> ProbeRunner<FakeSessionAdapter> {
    ProbeRunner::new(
        sessions.clone(),
        ProbeRunnerConfig {
            temp_dir: temp_dir.to_path_buf(),
            poll_interval: SPEC_POLL,
            ..ProbeRunnerConfig::default()
        },
    )
}

/// A plan item in a group with dependencies.
pub fn item(id: &str, group: u32, deps: &[&str]) -> PlanItem {
    let mut item = PlanItem::new(id, format!("Task {}", id));
    item.parallel_group = Some(group);
    item.dependencies = deps.iter().map(|d| TaskId::new(*d)).collect();
    item
}

/// Answer probe number `index` (0-based across the session's lifetime)
/// with `content` followed by the sentinel.
pub async fn answer_probe(sessions: FakeSessionAdapter, index: usize, content: String) {
    let cmd = loop {
        let spawns: Vec<String> = sessions
            .calls()
            .iter()
            .filter_map(|c| match c {
                SessionCall::Spawn { cmd, .. } => Some(cmd.clone()),
                _ => None,
            })
            .collect();
        if spawns.len() > index {
            break spawns[index].clone();
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    };
    let path = PathBuf::from(cmd.split(" > ").nth(1).unwrap().split(" 2>&1").next().unwrap());
    tokio::fs::write(&path, format!("{}\nHERD_PROBE_DONE\n", content))
        .await
        .unwrap();
}

/// A fake clock starting at a fixed epoch for readable assertions.
pub fn clock() -> FakeClock {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    clock
}
