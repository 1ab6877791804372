// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution bridge: drives a group schedule through an injected spawner.
//!
//! The hot path is `tick()`, run every [`EXECUTION_POLL_INTERVAL`]. A tick
//! drains completion reports, fires due timers, advances the scheduler,
//! and dispatches up to the per-group parallelism bound. The tick never
//! returns an error; failures are recorded as task status. Only
//! `load_plan`/`start` and the pause/resume pair signal programmer misuse
//! synchronously.

use crate::bus::Broadcaster;
use crate::model::ModelSelector;
use crate::spawner::{TaskAssignment, TaskCompletion, TaskReporter, TaskSpawner};
use crate::timers::TimerWheel;
use herd_core::{
    Clock, ExecutionMode, GroupScheduler, PlanItem, Schedule, ScheduleEvent, ScheduleStatus,
    TaskId, TaskStatus, TimerId,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// How often the tick loop runs.
pub const EXECUTION_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Parallel dispatch bound within one group.
pub const MAX_PARALLEL_TASKS_PER_GROUP: usize = 3;

/// A running group is abandoned after this long.
pub const GROUP_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Attempts per task before it fails for good.
pub const MAX_TASK_RETRIES: u32 = 3;

/// Backoff before a failed task is retried.
pub const TASK_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Execution history entries kept, newest first.
pub const MAX_EXECUTION_HISTORY: usize = 50;

/// Bridge lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
    Idle,
    Loading,
    Running,
    Paused,
    Completed,
    Partial,
    Failed,
    Cancelled,
}

impl BridgeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Partial | Self::Failed | Self::Cancelled
        )
    }
}

/// Programmer errors, surfaced synchronously to the caller.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no plan loaded")]
    NoPlanLoaded,
    #[error("an execution is already running")]
    AlreadyRunning,
    #[error("schedule already finished; load a plan to run again")]
    AlreadyFinished,
    #[error("bridge is not running")]
    NotRunning,
    #[error("bridge is not paused")]
    NotPaused,
    #[error(transparent)]
    InvalidPlan(#[from] herd_core::ScheduleError),
}

/// One execution in the history ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: String,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
    pub status: BridgeStatus,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub failed_tasks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

/// Events emitted by the bridge. `Progress` fires at least once per tick
/// while running; `Completed` fires exactly once per execution.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Schedule(ScheduleEvent),
    GroupStarted {
        group_number: u32,
        execution_mode: ExecutionMode,
    },
    TaskAssigned {
        task_id: TaskId,
        model: String,
        execution_mode: ExecutionMode,
        fresh_context: bool,
        /// Lightweight was requested but the spawner fell back to session.
        lightweight_fallback: bool,
    },
    TaskRetryScheduled {
        task_id: TaskId,
        retry_count: u32,
    },
    Progress {
        total_tasks: u32,
        completed_tasks: u32,
        failed_tasks: u32,
        running_tasks: u32,
        elapsed_ms: u64,
    },
    Paused,
    Resumed,
    Completed {
        status: BridgeStatus,
    },
    Cancelled {
        reason: String,
    },
}

struct BridgeInner {
    status: BridgeStatus,
    scheduler: Option<GroupScheduler>,
    running: HashSet<TaskId>,
    running_group: Option<u32>,
    timers: TimerWheel,
    history: VecDeque<ExecutionRecord>,
    next_execution_seq: u64,
    started_at_ms: Option<u64>,
    paused_at_ms: Option<u64>,
    paused_total_ms: u64,
}

/// Drives plan schedules to completion.
pub struct ExecutionBridge<C: Clock> {
    clock: C,
    spawner: Arc<dyn TaskSpawner>,
    selector: ModelSelector,
    events: Broadcaster<BridgeEvent>,
    reporter: TaskReporter,
    completions: Mutex<mpsc::UnboundedReceiver<TaskCompletion>>,
    inner: Mutex<BridgeInner>,
}

impl<C: Clock> ExecutionBridge<C> {
    pub fn new(clock: C, spawner: Arc<dyn TaskSpawner>, selector: ModelSelector) -> Self {
        let (reporter, completions) = TaskReporter::channel();
        Self {
            clock,
            spawner,
            selector,
            events: Broadcaster::default(),
            reporter,
            completions: Mutex::new(completions),
            inner: Mutex::new(BridgeInner {
                status: BridgeStatus::Idle,
                scheduler: None,
                running: HashSet::new(),
                running_group: None,
                timers: TimerWheel::new(),
                history: VecDeque::new(),
                next_execution_seq: 1,
                started_at_ms: None,
                paused_at_ms: None,
                paused_total_ms: 0,
            }),
        }
    }

    /// Subscribe to bridge events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// The reporter handed to spawners; exposed so an out-of-band
    /// supervisor can report on a spawner's behalf.
    pub fn reporter(&self) -> TaskReporter {
        self.reporter.clone()
    }

    pub fn status(&self) -> BridgeStatus {
        self.inner.lock().status
    }

    /// Snapshot of the current schedule, if a plan is loaded.
    pub fn schedule(&self) -> Option<Schedule> {
        self.inner
            .lock()
            .scheduler
            .as_ref()
            .map(|s| s.schedule().clone())
    }

    /// Execution history, newest first.
    pub fn history(&self) -> Vec<ExecutionRecord> {
        self.inner.lock().history.iter().cloned().collect()
    }

    /// Load a plan. Fails while an execution is running or paused.
    pub fn load_plan(&self, items: Vec<PlanItem>) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if matches!(inner.status, BridgeStatus::Running | BridgeStatus::Paused) {
            return Err(BridgeError::AlreadyRunning);
        }
        inner.status = BridgeStatus::Loading;
        let (scheduler, events) = match GroupScheduler::build(items) {
            Ok(built) => built,
            Err(e) => {
                inner.status = BridgeStatus::Idle;
                return Err(e.into());
            }
        };
        inner.scheduler = Some(scheduler);
        inner.running.clear();
        inner.running_group = None;
        inner.status = BridgeStatus::Idle;
        drop(inner);

        for event in events {
            self.events.emit(BridgeEvent::Schedule(event));
        }
        Ok(())
    }

    /// Start executing the loaded plan.
    pub fn start(&self) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if matches!(inner.status, BridgeStatus::Running | BridgeStatus::Paused) {
            return Err(BridgeError::AlreadyRunning);
        }
        let Some(scheduler) = inner.scheduler.as_ref() else {
            return Err(BridgeError::NoPlanLoaded);
        };
        if scheduler.schedule().status.is_terminal() {
            return Err(BridgeError::AlreadyFinished);
        }
        let total_tasks = scheduler.schedule().total_tasks;

        let now_ms = self.clock.epoch_ms();
        inner.status = BridgeStatus::Running;
        inner.started_at_ms = Some(now_ms);
        inner.paused_at_ms = None;
        inner.paused_total_ms = 0;

        let id = format!("exec-{}", inner.next_execution_seq);
        inner.next_execution_seq += 1;
        inner.history.push_front(ExecutionRecord {
            id,
            started_at_ms: now_ms,
            ended_at_ms: None,
            status: BridgeStatus::Running,
            total_tasks,
            completed_tasks: 0,
            failed_tasks: 0,
            estimated_cost: None,
        });
        inner.history.truncate(MAX_EXECUTION_HISTORY);

        tracing::info!(total_tasks, "execution started");
        Ok(())
    }

    /// Stop assigning new tasks; in-flight tasks continue.
    pub fn pause(&self) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if inner.status != BridgeStatus::Running {
            return Err(BridgeError::NotRunning);
        }
        inner.status = BridgeStatus::Paused;
        inner.paused_at_ms = Some(self.clock.epoch_ms());
        drop(inner);
        self.events.emit(BridgeEvent::Paused);
        Ok(())
    }

    /// Resume the tick loop and elapsed-time accumulation.
    pub fn resume(&self) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if inner.status != BridgeStatus::Paused {
            return Err(BridgeError::NotPaused);
        }
        let now_ms = self.clock.epoch_ms();
        if let Some(paused_at) = inner.paused_at_ms.take() {
            inner.paused_total_ms += now_ms.saturating_sub(paused_at);
        }
        inner.status = BridgeStatus::Running;
        drop(inner);
        self.events.emit(BridgeEvent::Resumed);
        Ok(())
    }

    /// Cancel the execution. Idempotent. Running children are left to
    /// drain; hard stops are the spawner's business via `abort`.
    pub fn cancel(&self, reason: &str) {
        let mut inner = self.inner.lock();
        if inner.status == BridgeStatus::Cancelled {
            return;
        }
        inner.timers.clear();
        inner.running_group = None;
        inner.status = BridgeStatus::Cancelled;
        let now_ms = self.clock.epoch_ms();
        close_history_entry(&mut inner, BridgeStatus::Cancelled, now_ms);
        drop(inner);

        tracing::info!(reason, "execution cancelled");
        self.events.emit(BridgeEvent::Cancelled {
            reason: reason.to_string(),
        });
    }

    /// One scheduling step. Never raises; outcomes land in task status and
    /// the event stream.
    pub async fn tick(&self) {
        let (events, assignments) = {
            let mut inner = self.inner.lock();
            if inner.status != BridgeStatus::Running {
                return;
            }
            let now = self.clock.now();
            let now_ms = self.clock.epoch_ms();
            let mut events: Vec<BridgeEvent> = Vec::new();

            // 1. Drain completion reports
            loop {
                let completion = self.completions.lock().try_recv();
                match completion {
                    Ok(c) => self.apply_completion(&mut inner, c, now_ms, &mut events),
                    Err(_) => break,
                }
            }

            // 2. Fire due timers
            for timer in inner.timers.fired(now) {
                if let Some(group) = timer.group_number() {
                    self.apply_group_timeout(&mut inner, group, now_ms, &mut events);
                } else if let Some(task_id) = timer.retried_task() {
                    self.apply_retry(&mut inner, &task_id, now_ms, &mut events);
                }
            }

            self.release_finished_group(&mut inner);

            // 3. Terminal schedule ends the execution
            let schedule_status = inner
                .scheduler
                .as_ref()
                .map(|s| s.schedule().status)
                .unwrap_or(ScheduleStatus::Pending);
            if schedule_status.is_terminal() {
                self.finish_execution(&mut inner, schedule_status, now_ms, &mut events);
                drop(inner);
                for event in events {
                    self.events.emit(event);
                }
                return;
            }

            // 4. Advance the current group, or start the next ready one
            let assignments = self.advance_groups(&mut inner, now_ms, &mut events);

            (events, assignments)
        };

        for event in events {
            self.events.emit(event);
        }

        // 5. Dispatch outside the lock; bounded by the per-group cap
        let mut spawn_failures: Vec<(TaskId, String)> = Vec::new();
        for (assignment, group_mode) in assignments {
            if let Err(error) = self.dispatch(assignment.clone(), group_mode).await {
                spawn_failures.push((assignment.task_id.clone(), error));
            }
        }

        if !spawn_failures.is_empty() {
            let mut events = Vec::new();
            {
                let mut inner = self.inner.lock();
                let now = self.clock.now();
                let now_ms = self.clock.epoch_ms();
                for (task_id, error) in spawn_failures {
                    self.handle_task_failure(&mut inner, &task_id, &error, now, now_ms, &mut events);
                }
                self.release_finished_group(&mut inner);
            }
            for event in events {
                self.events.emit(event);
            }
        }

        // 6. Progress, at least once per tick while running
        self.emit_progress();
    }

    /// Run the tick loop until the execution reaches a terminal state.
    /// Returns a shutdown sender; dropping it also stops the loop.
    pub fn start_ticker(self: &Arc<Self>) -> oneshot::Sender<()> {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(EXECUTION_POLL_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        bridge.tick().await;
                        if bridge.status().is_terminal() {
                            break;
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });
        shutdown_tx
    }

    fn apply_completion(
        &self,
        inner: &mut BridgeInner,
        completion: TaskCompletion,
        now_ms: u64,
        events: &mut Vec<BridgeEvent>,
    ) {
        // Reports for tasks no longer tracked (group timeout, cancel,
        // stale retry) are dropped — the completion slot is single-use.
        if !inner.running.contains(&completion.task_id) {
            tracing::debug!(task_id = %completion.task_id, "dropping stale completion report");
            return;
        }
        let now = self.clock.now();
        match completion.result {
            Ok(()) => {
                inner.running.remove(&completion.task_id);
                if let Some(scheduler) = inner.scheduler.as_mut() {
                    let schedule_events = scheduler.update_task_status(
                        &completion.task_id,
                        TaskStatus::Completed,
                        None,
                        now_ms,
                    );
                    events.extend(schedule_events.into_iter().map(BridgeEvent::Schedule));
                }
            }
            Err(error) => {
                self.handle_task_failure(inner, &completion.task_id, &error, now, now_ms, events);
            }
        }
    }

    /// Retry-or-fail policy for one task failure.
    fn handle_task_failure(
        &self,
        inner: &mut BridgeInner,
        task_id: &TaskId,
        error: &str,
        now: std::time::Instant,
        now_ms: u64,
        events: &mut Vec<BridgeEvent>,
    ) {
        inner.running.remove(task_id);
        let Some(scheduler) = inner.scheduler.as_mut() else {
            return;
        };
        let retry_count = scheduler.increment_retry(task_id);
        if retry_count < MAX_TASK_RETRIES {
            tracing::info!(task_id = %task_id, retry_count, error, "task failed, scheduling retry");
            inner
                .timers
                .set(TimerId::task_retry(task_id), TASK_RETRY_DELAY, now);
            events.push(BridgeEvent::TaskRetryScheduled {
                task_id: task_id.clone(),
                retry_count,
            });
        } else {
            tracing::warn!(task_id = %task_id, retry_count, error, "task failed for good");
            let mut schedule_events = scheduler.update_task_status(
                task_id,
                TaskStatus::Failed,
                Some(error.to_string()),
                now_ms,
            );
            schedule_events.extend(scheduler.mark_dependent_tasks_blocked(task_id, now_ms));
            events.extend(schedule_events.into_iter().map(BridgeEvent::Schedule));
        }
    }

    /// A retry timer fired: put the task back into the pending pool.
    fn apply_retry(
        &self,
        inner: &mut BridgeInner,
        task_id: &TaskId,
        now_ms: u64,
        events: &mut Vec<BridgeEvent>,
    ) {
        let Some(scheduler) = inner.scheduler.as_mut() else {
            return;
        };
        if scheduler.task_status(task_id) != Some(TaskStatus::Running) {
            return;
        }
        let schedule_events =
            scheduler.update_task_status(task_id, TaskStatus::Pending, None, now_ms);
        events.extend(schedule_events.into_iter().map(BridgeEvent::Schedule));
    }

    /// A group ran out of time: running tasks fail, pending tasks skip,
    /// dependents cascade.
    fn apply_group_timeout(
        &self,
        inner: &mut BridgeInner,
        group_number: u32,
        now_ms: u64,
        events: &mut Vec<BridgeEvent>,
    ) {
        tracing::warn!(group_number, "group timeout");
        let Some(scheduler) = inner.scheduler.as_mut() else {
            return;
        };
        let Some(group) = scheduler.schedule().group(group_number) else {
            return;
        };
        let members: Vec<(TaskId, TaskStatus)> = group
            .tasks
            .iter()
            .map(|t| (t.id().clone(), t.status))
            .collect();

        for (task_id, status) in members {
            let new_status = match status {
                TaskStatus::Running => TaskStatus::Failed,
                TaskStatus::Pending => TaskStatus::Skipped,
                _ => continue,
            };
            inner.running.remove(&task_id);
            let mut schedule_events = scheduler.update_task_status(
                &task_id,
                new_status,
                Some("Group timeout".to_string()),
                now_ms,
            );
            schedule_events.extend(scheduler.mark_dependent_tasks_blocked(&task_id, now_ms));
            events.extend(schedule_events.into_iter().map(BridgeEvent::Schedule));
        }
    }

    /// Clear group bookkeeping once the running group reaches a terminal
    /// status.
    fn release_finished_group(&self, inner: &mut BridgeInner) {
        let Some(group_number) = inner.running_group else {
            return;
        };
        let finished = inner
            .scheduler
            .as_ref()
            .and_then(|s| s.schedule().group(group_number))
            .map(|g| g.status.is_terminal())
            .unwrap_or(true);
        if finished {
            inner.timers.cancel(&TimerId::group_timeout(group_number));
            inner.running_group = None;
        }
    }

    /// Start the next ready group if none is running, then fill the
    /// running group's free slots with ready tasks.
    fn advance_groups(
        &self,
        inner: &mut BridgeInner,
        now_ms: u64,
        events: &mut Vec<BridgeEvent>,
    ) -> Vec<(TaskAssignment, ExecutionMode)> {
        let now = self.clock.now();

        if inner.running_group.is_none() {
            let Some(scheduler) = inner.scheduler.as_mut() else {
                return Vec::new();
            };
            if let Some(group_number) = scheduler.next_ready_group() {
                scheduler.mark_group_running(group_number, now_ms);
                inner.running_group = Some(group_number);
                inner
                    .timers
                    .set(TimerId::group_timeout(group_number), GROUP_TIMEOUT, now);
                let mode = scheduler
                    .schedule()
                    .group(group_number)
                    .map(|g| g.execution_mode)
                    .unwrap_or(ExecutionMode::Session);
                tracing::info!(group_number, mode = ?mode, "group started");
                events.push(BridgeEvent::GroupStarted {
                    group_number,
                    execution_mode: mode,
                });
            }
        }

        let Some(group_number) = inner.running_group else {
            return Vec::new();
        };
        let capacity = MAX_PARALLEL_TASKS_PER_GROUP.saturating_sub(inner.running.len());
        if capacity == 0 {
            return Vec::new();
        }

        let Some(scheduler) = inner.scheduler.as_mut() else {
            return Vec::new();
        };
        let group_mode = scheduler
            .schedule()
            .group(group_number)
            .map(|g| g.execution_mode)
            .unwrap_or(ExecutionMode::Session);

        let ready: Vec<TaskId> = scheduler
            .ready_tasks_in_group(group_number)
            .into_iter()
            .take(capacity)
            .collect();

        let mut assignments = Vec::with_capacity(ready.len());
        for task_id in ready {
            let Some(task) = scheduler.task(&task_id) else {
                continue;
            };
            let model = self.selector.select(task);
            let assignment = TaskAssignment {
                task_id: task_id.clone(),
                title: task.item.title.clone(),
                description: task.item.description.clone(),
                agent_type: task.resolved_agent_type,
                group_number,
                model,
                execution_mode: group_mode,
                requires_fresh_context: task.item.requires_fresh_context,
            };

            let schedule_events =
                scheduler.update_task_status(&task_id, TaskStatus::Running, None, now_ms);
            events.extend(schedule_events.into_iter().map(BridgeEvent::Schedule));
            inner.running.insert(task_id);
            assignments.push((assignment, group_mode));
        }
        assignments
    }

    /// Hand one assignment to the spawner, falling back from lightweight
    /// to session mode when the spawner does not support it.
    async fn dispatch(
        &self,
        assignment: TaskAssignment,
        group_mode: ExecutionMode,
    ) -> Result<(), String> {
        let reporter = self.reporter.clone();
        let mut fallback = false;

        let result = match group_mode {
            ExecutionMode::Lightweight => {
                match self
                    .spawner
                    .spawn_lightweight(&assignment, reporter.clone())
                    .await
                {
                    Some(result) => result,
                    None => {
                        tracing::debug!(
                            task_id = %assignment.task_id,
                            "lightweight unsupported, falling back to session"
                        );
                        fallback = true;
                        self.spawner.spawn_session(&assignment, reporter).await
                    }
                }
            }
            ExecutionMode::Session => self.spawner.spawn_session(&assignment, reporter).await,
        };

        self.events.emit(BridgeEvent::TaskAssigned {
            task_id: assignment.task_id.clone(),
            model: assignment.model.model.clone(),
            execution_mode: if fallback {
                ExecutionMode::Session
            } else {
                group_mode
            },
            fresh_context: assignment.requires_fresh_context,
            lightweight_fallback: fallback,
        });

        result.map(|_| ())
    }

    fn finish_execution(
        &self,
        inner: &mut BridgeInner,
        schedule_status: ScheduleStatus,
        now_ms: u64,
        events: &mut Vec<BridgeEvent>,
    ) {
        inner.timers.clear();
        inner.running.clear();
        inner.running_group = None;
        let status = match schedule_status {
            ScheduleStatus::Completed => BridgeStatus::Completed,
            ScheduleStatus::Partial => BridgeStatus::Partial,
            _ => BridgeStatus::Failed,
        };
        inner.status = status;
        close_history_entry(inner, status, now_ms);
        tracing::info!(status = ?status, "execution finished");
        events.push(BridgeEvent::Completed { status });
    }

    fn emit_progress(&self) {
        let inner = self.inner.lock();
        if inner.status != BridgeStatus::Running {
            return;
        }
        let Some(scheduler) = inner.scheduler.as_ref() else {
            return;
        };
        let schedule = scheduler.schedule();
        let now_ms = self.clock.epoch_ms();
        let elapsed_ms = inner
            .started_at_ms
            .map(|started| now_ms.saturating_sub(started).saturating_sub(inner.paused_total_ms))
            .unwrap_or(0);
        let event = BridgeEvent::Progress {
            total_tasks: schedule.total_tasks,
            completed_tasks: schedule.completed_tasks,
            failed_tasks: schedule.failed_tasks,
            running_tasks: inner.running.len() as u32,
            elapsed_ms,
        };
        drop(inner);
        self.events.emit(event);
    }
}

/// Close the newest history entry with final status and counters.
fn close_history_entry(inner: &mut BridgeInner, status: BridgeStatus, now_ms: u64) {
    let (completed, failed) = inner
        .scheduler
        .as_ref()
        .map(|s| {
            let schedule = s.schedule();
            (schedule.completed_tasks, schedule.failed_tasks)
        })
        .unwrap_or((0, 0));
    if let Some(record) = inner.history.front_mut() {
        if record.ended_at_ms.is_none() {
            record.ended_at_ms = Some(now_ms);
            record.status = status;
            record.completed_tasks = completed;
            record.failed_tasks = failed;
        }
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
