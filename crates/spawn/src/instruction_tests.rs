// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use herd_core::AgentId;

fn spec(text: &str) -> SpawnSpec {
    SpawnSpec::parse(text).unwrap()
}

fn workspace() -> SpawnWorkspace {
    SpawnWorkspace {
        agent_id: AgentId::new("kid-1"),
        root: std::path::PathBuf::from("/work/spawns/kid-1"),
    }
}

#[test]
fn sections_appear_in_order() {
    let spec = spec("---\nagentId: kid-1\nname: helper\n---\nDo the work.");
    let text = render_instructions(&spec, &workspace(), 1, &[]);

    let sections = [
        "## Identity",
        "## Task",
        "## Success criteria",
        "## Communication protocol",
        "## Constraints",
        "## Working directory",
        "## Context files",
        "## Important notes",
    ];
    let mut last = 0;
    for section in sections {
        let pos = text.find(section).unwrap_or_else(|| panic!("missing {}", section));
        assert!(pos > last, "{} out of order", section);
        last = pos;
    }
}

#[test]
fn protocol_names_exact_comms_paths() {
    let spec = spec("---\nagentId: kid-1\n---\nwork");
    let text = render_instructions(&spec, &workspace(), 0, &[]);

    assert!(text.contains("/work/spawns/kid-1/comms/progress.json"));
    assert!(text.contains("/work/spawns/kid-1/comms/messages"));
    assert!(text.contains("/work/spawns/kid-1/comms/result.md"));
    assert!(text.contains("<promise>AGENT_KID-1_DONE</promise>"));
}

#[test]
fn identity_and_constraints_reflect_spec() {
    let spec = spec(
        "---\nagentId: kid-1\ntype: review\npriority: high\nmaxTokens: 9000\n\
         timeoutMinutes: 15\ncanModifyParentFiles: true\noutputFormat: json\n---\nwork",
    );
    let text = render_instructions(&spec, &workspace(), 2, &[]);

    assert!(text.contains("Kind: review"));
    assert!(text.contains("Priority: high"));
    assert!(text.contains("Spawn depth: 2"));
    assert!(text.contains("Time limit: 15 minutes"));
    assert!(text.contains("Token budget: 9000"));
    assert!(text.contains("MAY modify files in the parent workspace"));
    assert!(text.contains("Output format: json"));
}

#[test]
fn disabled_progress_is_called_out() {
    let spec = spec("---\nagentId: kid-1\nprogressIntervalSeconds: 0\n---\nwork");
    let text = render_instructions(&spec, &workspace(), 0, &[]);
    assert!(text.contains("Progress reporting is disabled"));
}

#[test]
fn context_manifest_lists_copies() {
    let spec = spec("---\nagentId: kid-1\n---\nwork");
    let text = render_instructions(
        &spec,
        &workspace(),
        0,
        &["notes.md".to_string(), "plan.md".to_string()],
    );
    assert!(text.contains("- `notes.md`"));
    assert!(text.contains("- `plan.md`"));
}

#[test]
fn initial_prompt_points_at_instructions_and_phrase() {
    let spec = spec("---\nagentId: kid-1\n---\nwork");
    let prompt = initial_prompt(&spec, &workspace());
    assert!(prompt.contains("/work/spawns/kid-1/INSTRUCTIONS.md"));
    assert!(prompt.contains("<promise>AGENT_KID-1_DONE</promise>"));
}
