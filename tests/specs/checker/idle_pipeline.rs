// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The layered idle/plan detection pipeline over a terminal buffer.

use crate::prelude::*;
use herd_adapters::FakeSessionAdapter;
use herd_core::{SessionId, TerminalBuffer};
use herd_engine::{AiChecker, CheckOutcome, CheckerStatus};
use std::time::Duration;

/// A session's scrollback flows through the buffer into the checker; the
/// probe's answer becomes a definitive verdict with cooldown pacing.
#[tokio::test]
async fn terminal_tail_to_idle_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = FakeSessionAdapter::new();
    let clock = clock();

    let mut buffer = TerminalBuffer::new();
    buffer.append(b"$ cargo test\nrunning 42 tests\ntest result: ok\n$ ");

    let checker = AiChecker::idle(
        SessionId::new("sess-1"),
        "probe-model",
        fast_probe(&sessions, dir.path()),
        clock.clone(),
    );

    let tail = String::from_utf8(buffer.tail(16_000)).unwrap();
    let (outcome, _) = tokio::join!(
        checker.check(&tail),
        answer_probe(sessions.clone(), 0, "IDLE\nShell prompt visible".to_string()),
    );

    let CheckOutcome::Completed(result) = outcome else {
        panic!("expected a verdict, got {:?}", outcome);
    };
    assert_eq!(result.verdict, "IDLE");
    assert!(result.positive);
    assert_eq!(result.reasoning, "Shell prompt visible");

    // Probe hygiene: temp file removed, probe session gone
    assert!(sessions.live_sessions().is_empty());
    assert_eq!(
        std::fs::read_dir(dir.path()).unwrap().count(),
        0,
        "probe temp files must be cleaned up"
    );

    // Paced: a second check inside the cooldown does nothing
    assert_eq!(checker.check(&tail).await, CheckOutcome::Busy);
    clock.advance(Duration::from_secs(180));
    let (outcome, _) = tokio::join!(
        checker.check(&tail),
        answer_probe(sessions.clone(), 1, "WORKING".to_string()),
    );
    assert!(matches!(outcome, CheckOutcome::Completed(_)));
}

/// Error budget: repeated probe failures disable the checker for good,
/// and a disabled checker never touches the probe again.
#[tokio::test]
async fn failing_pipeline_disables_itself() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = FakeSessionAdapter::new();
    let clock = clock();

    let checker = AiChecker::new(
        SessionId::new("sess-1"),
        herd_engine::checker::plan_domain(),
        herd_engine::CheckerConfig {
            enabled: true,
            model: "probe-model".to_string(),
            max_context_chars: 8_000,
            check_timeout: Duration::from_millis(40),
            cooldown: Duration::from_secs(30),
            error_cooldown: Duration::from_secs(30),
            max_consecutive_errors: 3,
        },
        fast_probe(&sessions, dir.path()),
        clock.clone(),
    );

    for _ in 0..3 {
        // No probe answer arrives: each check times out
        let outcome = checker.check("tail").await;
        assert!(matches!(outcome, CheckOutcome::Failed(_)));
        clock.advance(Duration::from_secs(30));
    }
    assert_eq!(checker.status(), CheckerStatus::Disabled);

    let probes_before = sessions.calls().len();
    assert_eq!(checker.check("tail").await, CheckOutcome::Disabled);
    assert_eq!(sessions.calls().len(), probes_before);
}
