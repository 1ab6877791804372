// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use herd_adapters::{FakeSessionAdapter, SessionCall};
use herd_core::{AgentKind, ExecutionMode};
use herd_engine::ModelChoice;

fn assignment(id: &str) -> TaskAssignment {
    TaskAssignment {
        task_id: TaskId::new(id),
        title: format!("Task {}", id),
        description: "Details here".to_string(),
        agent_type: AgentKind::General,
        group_number: 0,
        model: ModelChoice {
            model: "sonnet".to_string(),
            reason: "test".to_string(),
            optimizer_recommendation: None,
        },
        execution_mode: ExecutionMode::Session,
        requires_fresh_context: false,
    }
}

fn spawner(sessions: &FakeSessionAdapter) -> SessionTaskSpawner<FakeSessionAdapter> {
    SessionTaskSpawner::new(
        sessions.clone(),
        AssistantCommand::default(),
        PathBuf::from("/tmp"),
    )
}

#[yare::parameterized(
    bare       = { None, "claude \"do it\"" },
    with_model = { Some("opus"), "claude --model opus \"do it\"" },
)]
fn command_rendering(model: Option<&str>, expected: &str) {
    let command = AssistantCommand::default();
    assert_eq!(command.build(model, "do it"), expected);
}

#[test]
fn command_escapes_prompt() {
    let command = AssistantCommand::default();
    let rendered = command.build(None, "watch `this` and $that");
    assert_eq!(rendered, "claude \"watch \\`this\\` and \\$that\"");
}

#[test]
fn extra_args_precede_model() {
    let command = AssistantCommand {
        binary: "claude".to_string(),
        args: vec!["--permission-mode".to_string(), "plan".to_string()],
    };
    assert_eq!(
        command.build(Some("opus"), "p"),
        "claude --permission-mode plan --model opus \"p\""
    );
}

#[tokio::test]
async fn spawn_session_launches_with_model_and_prompt() {
    let sessions = FakeSessionAdapter::new();
    let spawner = spawner(&sessions);
    let (reporter, _rx) = TaskReporter::channel();

    let spawned = spawner
        .spawn_session(&assignment("t1"), reporter)
        .await
        .unwrap();
    assert!(spawned.session_id.is_some());

    let calls = sessions.calls();
    let SessionCall::Spawn { name, cmd, .. } = &calls[0] else {
        panic!("expected spawn");
    };
    assert_eq!(name, "task-t1");
    assert!(cmd.contains("--model sonnet"));
    assert!(cmd.contains("Task t1"));
    assert!(cmd.contains("Details here"));

    assert_eq!(spawner.running_sessions().len(), 1);
}

#[tokio::test]
async fn lightweight_is_unsupported() {
    let sessions = FakeSessionAdapter::new();
    let spawner = spawner(&sessions);
    let (reporter, _rx) = TaskReporter::channel();
    assert!(spawner
        .spawn_lightweight(&assignment("t1"), reporter)
        .await
        .is_none());
}

#[tokio::test]
async fn abort_kills_the_task_session() {
    let sessions = FakeSessionAdapter::new();
    let spawner = spawner(&sessions);
    let (reporter, _rx) = TaskReporter::channel();

    spawner.spawn_session(&assignment("t1"), reporter).await.unwrap();
    spawner.abort(&TaskId::new("t1")).await;

    assert!(spawner.running_sessions().is_empty());
    assert!(sessions.live_sessions().is_empty());
}

#[tokio::test]
async fn spawn_failure_surfaces_as_error() {
    let sessions = FakeSessionAdapter::new();
    sessions.fail_spawns(true);
    let spawner = spawner(&sessions);
    let (reporter, _rx) = TaskReporter::channel();

    let err = spawner
        .spawn_session(&assignment("t1"), reporter)
        .await
        .unwrap_err();
    assert!(err.contains("spawn failed"));
}
