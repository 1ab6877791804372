// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan item and execution schedule data model.
//!
//! A plan is a flat list of [`PlanItem`]s carrying optional parallel-group
//! numbers and dependency edges. The scheduler buckets items into
//! [`ExecutionGroup`]s and tracks per-task and per-group status as the
//! bridge executes them.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};

/// Kind of agent a task wants to run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Read-only exploration and research
    Explore,
    /// Code-writing work
    Implement,
    /// Reviewing existing changes
    Review,
    /// Test authoring or execution
    Test,
    /// Anything else
    #[default]
    General,
}

impl AgentKind {
    /// Parse a kind name, falling back to `General` for unknown values.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "explore" => Self::Explore,
            "implement" => Self::Implement,
            "review" => Self::Review,
            "test" => Self::Test,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Implement => "implement",
            Self::Review => "review",
            Self::Test => "test",
            Self::General => "general",
        }
    }
}

/// A single task in a plan, as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Bucket for parallel execution; absent means group 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<AgentKind>,
    /// Author's model tier hint (`fast`, `balanced`, `deep`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_model: Option<String>,
    #[serde(default)]
    pub requires_fresh_context: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,
}

impl PlanItem {
    /// Minimal item with just an id and title; everything else default.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            parallel_group: None,
            agent_type: None,
            recommended_model: None,
            requires_fresh_context: false,
            estimated_tokens: None,
            input_files: Vec::new(),
            output_files: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

/// Status of a single scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// A plan item augmented with execution state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTask {
    pub item: PlanItem,
    pub status: TaskStatus,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Agent kind after defaulting (absent hints resolve to `general`).
    pub resolved_agent_type: AgentKind,
    /// Group this task landed in (after the `?? 0` default).
    pub parallel_group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

impl GroupTask {
    pub fn id(&self) -> &TaskId {
        &self.item.id
    }
}

/// How a group's tasks get executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Each task gets a fresh supervised session.
    Session,
    /// Tasks run as in-process sub-calls when the spawner supports it.
    Lightweight,
}

/// Status of an execution group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Pending,
    Ready,
    Running,
    Completed,
    /// Some tasks completed, some failed or were skipped.
    Partial,
    Failed,
}

impl GroupStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Partial | Self::Failed)
    }

    /// Whether a dependent group may start on top of this one.
    ///
    /// Partial results are accepted so independent work proceeds past
    /// local failures.
    pub fn satisfies_dependents(&self) -> bool {
        matches!(self, Self::Completed | Self::Partial)
    }
}

/// A set of tasks whose cross-group dependencies are all in earlier groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionGroup {
    pub group_number: u32,
    pub tasks: Vec<GroupTask>,
    pub status: GroupStatus,
    pub execution_mode: ExecutionMode,
    pub execution_mode_rationale: String,
    pub depends_on_groups: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    pub completed_count: u32,
    pub failed_count: u32,
    pub skipped_count: u32,
}

impl ExecutionGroup {
    pub fn task(&self, id: &TaskId) -> Option<&GroupTask> {
        self.tasks.iter().find(|t| t.id() == id)
    }
}

/// Overall schedule status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Running,
    Completed,
    Partial,
    Failed,
}

impl ScheduleStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Partial | Self::Failed)
    }
}

/// A full execution schedule: groups ascending by number plus aggregate
/// counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub groups: Vec<ExecutionGroup>,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub failed_tasks: u32,
    pub current_group_index: usize,
    pub status: ScheduleStatus,
}

impl Schedule {
    pub fn group(&self, number: u32) -> Option<&ExecutionGroup> {
        self.groups.iter().find(|g| g.group_number == number)
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
