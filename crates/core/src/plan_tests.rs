// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    explore   = { "explore", AgentKind::Explore },
    implement = { "implement", AgentKind::Implement },
    review    = { "Review", AgentKind::Review },
    test_kind = { "TEST", AgentKind::Test },
    general   = { "general", AgentKind::General },
    unknown   = { "wizard", AgentKind::General },
    empty     = { "", AgentKind::General },
)]
fn agent_kind_parse_lossy(input: &str, expected: AgentKind) {
    assert_eq!(AgentKind::parse_lossy(input), expected);
}

#[test]
fn plan_item_deserializes_with_defaults() {
    let item: PlanItem = serde_json::from_str(r#"{"id": "a", "title": "Task A"}"#).unwrap();
    assert_eq!(item.id, "a");
    assert_eq!(item.parallel_group, None);
    assert!(!item.requires_fresh_context);
    assert!(item.dependencies.is_empty());
}

#[test]
fn plan_item_full_roundtrip() {
    let item: PlanItem = serde_json::from_str(
        r#"{
            "id": "b",
            "title": "Task B",
            "description": "do things",
            "parallelGroup": 2,
            "agentType": "implement",
            "recommendedModel": "deep",
            "requiresFreshContext": true,
            "estimatedTokens": 60000,
            "outputFiles": ["src/a.rs", "src/b.rs"],
            "dependencies": ["a"]
        }"#,
    )
    .unwrap();
    assert_eq!(item.parallel_group, Some(2));
    assert_eq!(item.agent_type, Some(AgentKind::Implement));
    assert_eq!(item.estimated_tokens, Some(60_000));

    let json = serde_json::to_value(&item).unwrap();
    let back: PlanItem = serde_json::from_value(json).unwrap();
    assert_eq!(back, item);
}

#[test]
fn task_status_terminality() {
    assert!(!TaskStatus::Pending.is_terminal());
    assert!(!TaskStatus::Running.is_terminal());
    assert!(TaskStatus::Completed.is_terminal());
    assert!(TaskStatus::Failed.is_terminal());
    assert!(TaskStatus::Skipped.is_terminal());
}

#[test]
fn partial_groups_satisfy_dependents() {
    assert!(GroupStatus::Completed.satisfies_dependents());
    assert!(GroupStatus::Partial.satisfies_dependents());
    assert!(!GroupStatus::Failed.satisfies_dependents());
    assert!(!GroupStatus::Running.satisfies_dependents());
    assert!(!GroupStatus::Pending.satisfies_dependents());
}
