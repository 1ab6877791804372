// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The spawn protocol end to end: spec in, child out, result back.

use crate::prelude::*;
use herd_adapters::FakeSessionAdapter;
use herd_spawn::{OrchestratorConfig, SpawnFailure, SpawnOrchestrator};
use herd_taskspec::{ResultStatus, SpawnSpec};
use std::time::Duration;

fn config() -> OrchestratorConfig {
    OrchestratorConfig {
        progress_poll_interval: SPEC_POLL,
        ..OrchestratorConfig::default()
    }
}

/// Oversized and unknown spec values degrade to defaults; the child's
/// result comes back within a poll interval of the completion phrase.
#[tokio::test]
async fn lossy_spec_then_full_round_trip() {
    // Header with out-of-range values parses lossily
    let long_name = "A".repeat(100);
    let spec_text = format!(
        "---\nagentId: kid-1\nname: {}\ntype: unknown\ntimeoutMinutes: 300\n---\nDo the work.",
        long_name
    );
    let spec = SpawnSpec::parse(&spec_text).unwrap();
    assert_eq!(spec.name.len(), 80);
    assert_eq!(spec.kind, herd_core::AgentKind::General);
    assert_eq!(spec.timeout_minutes, 120);

    // And the same document drives a full spawn
    let dir = tempfile::tempdir().unwrap();
    let sessions = FakeSessionAdapter::new();
    let orch = SpawnOrchestrator::new(sessions.clone(), clock(), config());

    let child = {
        let sessions = sessions.clone();
        let result_path = dir
            .path()
            .join("spawns")
            .join("kid-1")
            .join("comms")
            .join("result.md");
        tokio::spawn(async move {
            let session = loop {
                if let Some(id) = sessions.live_sessions().first() {
                    break id.clone();
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            };
            tokio::fs::write(&result_path, "---\nstatus: completed\nsummary: ok\n---\n")
                .await
                .unwrap();
            sessions.push_output(&session, "<promise>AGENT_KID-1_DONE</promise>");
        })
    };

    let result = orch.spawn(&spec_text, dir.path()).await.unwrap();
    child.await.unwrap();

    assert_eq!(result.status, ResultStatus::Completed);
    assert_eq!(result.summary, "ok");

    // Cleanup: session and workspace both gone
    assert!(sessions.live_sessions().is_empty());
    assert!(!dir.path().join("spawns").join("kid-1").exists());
}

/// The child's instruction file spells out the comms contract the
/// orchestrator polls: progress path, messages, result, promise.
#[tokio::test]
async fn instruction_file_matches_polled_paths() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = FakeSessionAdapter::new();
    let orch = SpawnOrchestrator::new(sessions.clone(), clock(), config());

    // Child that dies immediately, leaving the workspace for inspection
    let killer = {
        let sessions = sessions.clone();
        tokio::spawn(async move {
            let session = loop {
                if let Some(id) = sessions.live_sessions().first() {
                    break id.clone();
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            };
            sessions.set_exited(&session);
        })
    };

    let err = orch
        .spawn("---\nagentId: kid-1\n---\nwork", dir.path())
        .await
        .unwrap_err();
    killer.await.unwrap();
    assert!(matches!(err, SpawnFailure::ChildExited(_)));

    let root = dir.path().join("spawns").join("kid-1");
    let instructions = std::fs::read_to_string(root.join("INSTRUCTIONS.md")).unwrap();
    for path in ["comms/progress.json", "comms/messages", "comms/result.md"] {
        assert!(
            instructions.contains(&root.join(path).display().to_string()),
            "instructions must name {}",
            path
        );
    }
    assert!(instructions.contains("<promise>AGENT_KID-1_DONE</promise>"));
}
