// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The child's instruction file.
//!
//! Written once at spawn time; the child is pointed at it by its initial
//! prompt. The communication-protocol section names the exact paths the
//! child must read and write under `comms/`.

use crate::workspace::SpawnWorkspace;
use herd_taskspec::{completion_signal, SpawnSpec};
use std::fmt::Write as _;

/// Render the instruction file for one child agent.
pub fn render_instructions(
    spec: &SpawnSpec,
    workspace: &SpawnWorkspace,
    depth: u32,
    context_files: &[String],
) -> String {
    let comms = workspace.comms_dir();
    let mut out = String::new();

    let _ = writeln!(out, "# Agent briefing: {}", spec.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Identity");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Agent id: `{}`", spec.agent_id);
    let _ = writeln!(out, "- Kind: {}", spec.kind.as_str());
    let _ = writeln!(out, "- Priority: {}", spec.priority.as_str());
    let _ = writeln!(out, "- Spawn depth: {}", depth);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Task");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", spec.instructions);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Success criteria");
    let _ = writeln!(out);
    match &spec.success_criteria {
        Some(criteria) => {
            let _ = writeln!(out, "{}", criteria);
        }
        None => {
            let _ = writeln!(out, "Complete the task as described above.");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Communication protocol");
    let _ = writeln!(out);
    if spec.progress_enabled() {
        let _ = writeln!(
            out,
            "- Progress: rewrite `{}` every {} seconds as a JSON object with \
             `phase`, `percentComplete`, `currentAction`, `subtasks`, \
             `filesModified`, `tokensUsed`, `costSoFar`, `updatedAt`.",
            comms.join("progress.json").display(),
            spec.progress_interval_seconds
        );
    } else {
        let _ = writeln!(out, "- Progress reporting is disabled for this task.");
    }
    let _ = writeln!(
        out,
        "- Messages: read new `NNN-parent.md` files in `{}`; reply by writing \
         the next `NNN-agent.md`.",
        comms.join("messages").display()
    );
    let _ = writeln!(
        out,
        "- Result: when finished, write `{}` with frontmatter `status: \
         completed` or `status: failed`, a `summary`, and a `filesChanged` \
         list, followed by your full output.",
        comms.join("result.md").display()
    );
    let _ = writeln!(
        out,
        "- Completion signal: after the result file is written, print \
         `{}` as the last line of your output.",
        completion_signal(&spec.completion_phrase)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Constraints");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Time limit: {} minutes.", spec.timeout_minutes);
    if let Some(max_tokens) = spec.max_tokens {
        let _ = writeln!(out, "- Token budget: {}.", max_tokens);
    }
    if let Some(max_cost) = spec.max_cost {
        let _ = writeln!(out, "- Cost budget: ${:.2}.", max_cost);
    }
    if spec.can_modify_parent_files {
        let _ = writeln!(out, "- You MAY modify files in the parent workspace.");
    } else {
        let _ = writeln!(
            out,
            "- Do NOT modify files outside your working directory; work on \
             the copies provided."
        );
    }
    let _ = writeln!(out, "- Output format: {}.", spec.output_format.as_str());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Working directory");
    let _ = writeln!(out);
    let _ = writeln!(out, "`{}`", workspace.root.display());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Context files");
    let _ = writeln!(out);
    if context_files.is_empty() {
        let _ = writeln!(out, "None provided.");
    } else {
        for file in context_files {
            let _ = writeln!(out, "- `{}`", file);
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Important notes");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "- The completion signal must appear exactly once, only after the \
         result file exists."
    );
    let _ = writeln!(
        out,
        "- If you cannot finish, still write the result file with `status: \
         failed` and a summary of what blocked you, then print the \
         completion signal."
    );

    out
}

/// The initial prompt injected into the child session.
pub fn initial_prompt(spec: &SpawnSpec, workspace: &SpawnWorkspace) -> String {
    format!(
        "Read {} and carry out the task it describes. Follow its \
         communication protocol exactly, and print {} when you are \
         finished.",
        workspace.instructions_path().display(),
        completion_signal(&spec.completion_phrase)
    )
}

#[cfg(test)]
#[path = "instruction_tests.rs"]
mod tests;
