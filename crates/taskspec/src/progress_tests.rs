// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn full_progress_parses() {
    let progress = AgentProgress::parse(
        r#"{
            "phase": "implementing",
            "percentComplete": 40,
            "currentAction": "editing src/lib.rs",
            "subtasks": [
                {"description": "read context", "status": "done"},
                {"description": "write code", "status": "in_progress"}
            ],
            "filesModified": ["src/lib.rs"],
            "tokensUsed": 12000,
            "costSoFar": 0.34,
            "updatedAt": 1700000000000
        }"#,
    )
    .unwrap();

    assert_eq!(progress.phase, "implementing");
    assert_eq!(progress.percent_complete, 40);
    assert_eq!(progress.subtasks.len(), 2);
    assert_eq!(progress.subtasks[1].status, "in_progress");
    assert_eq!(progress.files_modified, vec!["src/lib.rs"]);
    assert_eq!(progress.tokens_used, 12_000);
    assert_eq!(progress.updated_at, 1_700_000_000_000);
}

#[test]
fn missing_fields_default() {
    let progress = AgentProgress::parse(r#"{"phase": "starting"}"#).unwrap();
    assert_eq!(progress.phase, "starting");
    assert_eq!(progress.percent_complete, 0);
    assert!(progress.subtasks.is_empty());
    assert!(progress.files_modified.is_empty());
    assert_eq!(progress.tokens_used, 0);
    assert_eq!(progress.cost_so_far, 0.0);
}

#[test]
fn empty_object_is_valid() {
    let progress = AgentProgress::parse("{}").unwrap();
    assert_eq!(progress, AgentProgress::default());
}

#[test]
fn percent_clamped_to_100() {
    let progress = AgentProgress::parse(r#"{"percentComplete": 250}"#).unwrap();
    assert_eq!(progress.percent_complete, 100);
}

#[test]
fn invalid_json_is_error() {
    assert!(AgentProgress::parse("not json").is_err());
}
