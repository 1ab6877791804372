// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group scheduler: topological schedule over plan items.
//!
//! The scheduler is the single writer of task and group status. Mutations
//! go through its API and return the events they produced, in order:
//! task transitions precede the group completion they trigger, which
//! precedes schedule completion.

use crate::plan::{
    AgentKind, ExecutionGroup, ExecutionMode, GroupStatus, GroupTask, PlanItem, Schedule,
    ScheduleStatus, TaskStatus,
};
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Estimated-token threshold above which a task forces session mode (and
/// the deep model tier).
pub const SESSION_TOKEN_THRESHOLD: u64 = 50_000;

/// Ceiling under which a group of explore/general tasks may run lightweight.
pub const LIGHTWEIGHT_TOKEN_CEILING: u64 = 15_000;

/// More output files than this forces session mode.
pub const LIGHTWEIGHT_MAX_OUTPUT_FILES: usize = 2;

/// Errors from building a schedule. Signalled synchronously to the caller;
/// execution-time failures flow through task status instead.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("plan has no items")]
    EmptyPlan,
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),
    #[error("task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },
}

/// Events produced by scheduler mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleEvent {
    ScheduleBuilt {
        total_tasks: u32,
        group_count: u32,
    },
    TaskStatusChanged {
        task_id: TaskId,
        group_number: u32,
        status: TaskStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    GroupCompleted {
        group_number: u32,
        status: GroupStatus,
        completed: u32,
        failed: u32,
        skipped: u32,
    },
    ScheduleCompleted {
        status: ScheduleStatus,
        completed_tasks: u32,
        failed_tasks: u32,
    },
}

/// Builds and owns a [`Schedule`], tracking status as execution proceeds.
#[derive(Debug)]
pub struct GroupScheduler {
    schedule: Schedule,
    /// task id -> group number, for dependency lookups across groups.
    group_of: HashMap<TaskId, u32>,
}

impl GroupScheduler {
    /// Build a schedule from plan items.
    ///
    /// Items are bucketed by `parallel_group` (absent means 0), buckets
    /// sorted ascending. Dependencies on the same or a later group are
    /// ignored for group-level ordering but still gate the individual task
    /// in [`ready_tasks_in_group`](Self::ready_tasks_in_group).
    pub fn build(items: Vec<PlanItem>) -> Result<(Self, Vec<ScheduleEvent>), ScheduleError> {
        if items.is_empty() {
            return Err(ScheduleError::EmptyPlan);
        }

        let mut group_of: HashMap<TaskId, u32> = HashMap::new();
        for item in &items {
            let group = item.parallel_group.unwrap_or(0);
            if group_of.insert(item.id.clone(), group).is_some() {
                return Err(ScheduleError::DuplicateTask(item.id.clone()));
            }
        }
        for item in &items {
            for dep in &item.dependencies {
                if !group_of.contains_key(dep) {
                    return Err(ScheduleError::UnknownDependency {
                        task: item.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let mut buckets: BTreeMap<u32, Vec<PlanItem>> = BTreeMap::new();
        for item in items {
            let group = item.parallel_group.unwrap_or(0);
            buckets.entry(group).or_default().push(item);
        }

        let mut groups = Vec::with_capacity(buckets.len());
        let mut total_tasks = 0u32;
        for (group_number, bucket) in buckets {
            let mut depends_on_groups: Vec<u32> = bucket
                .iter()
                .flat_map(|item| item.dependencies.iter())
                .filter_map(|dep| group_of.get(dep).copied())
                .filter(|dep_group| *dep_group < group_number)
                .collect();
            depends_on_groups.sort_unstable();
            depends_on_groups.dedup();

            let (execution_mode, execution_mode_rationale) = decide_execution_mode(&bucket);

            let tasks: Vec<GroupTask> = bucket
                .into_iter()
                .map(|item| GroupTask {
                    resolved_agent_type: item.agent_type.unwrap_or_default(),
                    parallel_group: group_number,
                    status: TaskStatus::Pending,
                    retry_count: 0,
                    error: None,
                    started_at_ms: None,
                    completed_at_ms: None,
                    item,
                })
                .collect();
            total_tasks += tasks.len() as u32;

            groups.push(ExecutionGroup {
                group_number,
                tasks,
                status: GroupStatus::Pending,
                execution_mode,
                execution_mode_rationale,
                depends_on_groups,
                started_at_ms: None,
                completed_at_ms: None,
                completed_count: 0,
                failed_count: 0,
                skipped_count: 0,
            });
        }

        let group_count = groups.len() as u32;
        let schedule = Schedule {
            groups,
            total_tasks,
            completed_tasks: 0,
            failed_tasks: 0,
            current_group_index: 0,
            status: ScheduleStatus::Pending,
        };

        Ok((
            Self { schedule, group_of },
            vec![ScheduleEvent::ScheduleBuilt {
                total_tasks,
                group_count,
            }],
        ))
    }

    /// Read-only view of the schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// First pending group whose group dependencies are all satisfied
    /// (completed or partial). Flips it to ready and returns its number.
    pub fn next_ready_group(&mut self) -> Option<u32> {
        let satisfied: Vec<u32> = self
            .schedule
            .groups
            .iter()
            .filter(|g| g.status.satisfies_dependents())
            .map(|g| g.group_number)
            .collect();

        for group in &mut self.schedule.groups {
            if group.status != GroupStatus::Pending {
                continue;
            }
            if group
                .depends_on_groups
                .iter()
                .all(|dep| satisfied.contains(dep))
            {
                group.status = GroupStatus::Ready;
                return Some(group.group_number);
            }
        }
        None
    }

    /// Mark a ready group as running.
    pub fn mark_group_running(&mut self, group_number: u32, epoch_ms: u64) {
        if let Some(group) = self.group_mut(group_number) {
            group.status = GroupStatus::Running;
            group.started_at_ms = Some(epoch_ms);
        }
        if let Some(idx) = self
            .schedule
            .groups
            .iter()
            .position(|g| g.group_number == group_number)
        {
            self.schedule.current_group_index = idx;
        }
        self.schedule.status = ScheduleStatus::Running;
    }

    /// Pending tasks in a group whose dependencies (in any group) are all
    /// completed.
    pub fn ready_tasks_in_group(&self, group_number: u32) -> Vec<TaskId> {
        let Some(group) = self.schedule.group(group_number) else {
            return Vec::new();
        };
        group
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| {
                t.item
                    .dependencies
                    .iter()
                    .all(|dep| self.task_status(dep) == Some(TaskStatus::Completed))
            })
            .map(|t| t.id().clone())
            .collect()
    }

    /// Current status of a task, if it exists.
    pub fn task_status(&self, id: &TaskId) -> Option<TaskStatus> {
        let group_number = *self.group_of.get(id)?;
        self.schedule
            .group(group_number)?
            .task(id)
            .map(|t| t.status)
    }

    /// Look up a task's plan data.
    pub fn task(&self, id: &TaskId) -> Option<&GroupTask> {
        let group_number = *self.group_of.get(id)?;
        self.schedule.group(group_number)?.task(id)
    }

    /// Bump a task's retry counter and return the new value.
    pub fn increment_retry(&mut self, id: &TaskId) -> u32 {
        let Some(task) = self.task_mut(id) else {
            return 0;
        };
        task.retry_count += 1;
        task.retry_count
    }

    /// Update a task's status, maintaining counters and checking for group
    /// and schedule completion.
    pub fn update_task_status(
        &mut self,
        id: &TaskId,
        new_status: TaskStatus,
        error: Option<String>,
        epoch_ms: u64,
    ) -> Vec<ScheduleEvent> {
        let Some(group_number) = self.group_of.get(id).copied() else {
            return Vec::new();
        };
        let mut events = Vec::new();

        let old_status = {
            let Some(task) = self.task_mut(id) else {
                return Vec::new();
            };
            let old_status = task.status;
            // Terminal statuses never transition again
            if old_status.is_terminal() {
                return Vec::new();
            }
            task.status = new_status;
            task.error = error.clone();
            match new_status {
                TaskStatus::Running => task.started_at_ms = Some(epoch_ms),
                s if s.is_terminal() => task.completed_at_ms = Some(epoch_ms),
                _ => {}
            }
            old_status
        };
        if old_status != new_status {
            match new_status {
                TaskStatus::Completed => self.schedule.completed_tasks += 1,
                TaskStatus::Failed => self.schedule.failed_tasks += 1,
                _ => {}
            }
        }
        if let Some(group) = self.group_mut(group_number) {
            group.completed_count = group
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .count() as u32;
            group.failed_count = group
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Failed)
                .count() as u32;
            group.skipped_count = group
                .tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Skipped)
                .count() as u32;
        }

        events.push(ScheduleEvent::TaskStatusChanged {
            task_id: id.clone(),
            group_number,
            status: new_status,
            error,
        });

        if new_status.is_terminal() {
            events.extend(self.check_group_completion(group_number, epoch_ms));
        }
        events
    }

    /// Skip every pending task that (transitively) depends on a failed
    /// task. Cascades run through [`update_task_status`](Self::update_task_status)
    /// so each skip is reported as its own transition.
    pub fn mark_dependent_tasks_blocked(
        &mut self,
        failed_id: &TaskId,
        epoch_ms: u64,
    ) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        let dependents: Vec<TaskId> = self
            .schedule
            .groups
            .iter()
            .flat_map(|g| g.tasks.iter())
            .filter(|t| {
                t.status == TaskStatus::Pending && t.item.dependencies.contains(failed_id)
            })
            .map(|t| t.id().clone())
            .collect();

        for dependent in dependents {
            events.extend(self.update_task_status(
                &dependent,
                TaskStatus::Skipped,
                Some(format!("Blocked by failed task {}", failed_id)),
                epoch_ms,
            ));
            events.extend(self.mark_dependent_tasks_blocked(&dependent, epoch_ms));
        }
        events
    }

    fn check_group_completion(&mut self, group_number: u32, epoch_ms: u64) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        let Some(group) = self.group_mut(group_number) else {
            return events;
        };
        if group.status.is_terminal() {
            return events;
        }
        let open = group
            .tasks
            .iter()
            .any(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::Running));
        if open {
            return events;
        }

        group.completed_at_ms = Some(epoch_ms);
        group.status = if group.failed_count + group.skipped_count == 0 {
            GroupStatus::Completed
        } else if group.completed_count > 0 {
            GroupStatus::Partial
        } else {
            GroupStatus::Failed
        };
        events.push(ScheduleEvent::GroupCompleted {
            group_number,
            status: group.status,
            completed: group.completed_count,
            failed: group.failed_count,
            skipped: group.skipped_count,
        });

        events.extend(self.check_schedule_completion());
        events
    }

    fn check_schedule_completion(&mut self) -> Vec<ScheduleEvent> {
        let open = self
            .schedule
            .groups
            .iter()
            .any(|g| !g.status.is_terminal());
        if open || self.schedule.status.is_terminal() {
            return Vec::new();
        }

        let all_completed = self
            .schedule
            .groups
            .iter()
            .all(|g| g.status == GroupStatus::Completed);
        self.schedule.status = if all_completed {
            ScheduleStatus::Completed
        } else if self.schedule.completed_tasks > 0 {
            ScheduleStatus::Partial
        } else {
            ScheduleStatus::Failed
        };

        vec![ScheduleEvent::ScheduleCompleted {
            status: self.schedule.status,
            completed_tasks: self.schedule.completed_tasks,
            failed_tasks: self.schedule.failed_tasks,
        }]
    }

    fn group_mut(&mut self, group_number: u32) -> Option<&mut ExecutionGroup> {
        self.schedule
            .groups
            .iter_mut()
            .find(|g| g.group_number == group_number)
    }

    fn task_mut(&mut self, id: &TaskId) -> Option<&mut GroupTask> {
        let group_number = *self.group_of.get(id)?;
        self.group_mut(group_number)?
            .tasks
            .iter_mut()
            .find(|t| t.id() == id)
    }
}

/// Decide how a group's tasks execute, first matching rule wins.
fn decide_execution_mode(items: &[PlanItem]) -> (ExecutionMode, String) {
    for item in items {
        if item.estimated_tokens.unwrap_or(0) > SESSION_TOKEN_THRESHOLD {
            return (
                ExecutionMode::Session,
                format!(
                    "task {} estimates over {} tokens",
                    item.id, SESSION_TOKEN_THRESHOLD
                ),
            );
        }
    }
    for item in items {
        if matches!(
            item.agent_type,
            Some(AgentKind::Implement) | Some(AgentKind::Review)
        ) {
            return (
                ExecutionMode::Session,
                format!(
                    "task {} is {} work",
                    item.id,
                    item.agent_type.unwrap_or_default().as_str()
                ),
            );
        }
    }
    for item in items {
        if item.output_files.len() > LIGHTWEIGHT_MAX_OUTPUT_FILES {
            return (
                ExecutionMode::Session,
                format!(
                    "task {} writes {} output files",
                    item.id,
                    item.output_files.len()
                ),
            );
        }
    }
    for item in items {
        if item.requires_fresh_context {
            return (
                ExecutionMode::Session,
                format!("task {} requires fresh context", item.id),
            );
        }
    }

    let all_lightweight = items.iter().all(|item| {
        item.estimated_tokens.unwrap_or(0) < LIGHTWEIGHT_TOKEN_CEILING
            && matches!(
                item.agent_type.unwrap_or_default(),
                AgentKind::Explore | AgentKind::General
            )
    });
    if all_lightweight {
        return (
            ExecutionMode::Lightweight,
            "all tasks are small explore/general work".to_string(),
        );
    }

    (
        ExecutionMode::Session,
        "mixed workload, defaulting to session isolation".to_string(),
    )
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
