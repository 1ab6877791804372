// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task spawner seam.
//!
//! The bridge schedules tasks; an injected [`TaskSpawner`] actually runs
//! them (fresh supervised session, or an in-process lightweight call when
//! supported). Completion flows back through the [`TaskReporter`] handle
//! the bridge passes along with every assignment — the spawner never
//! holds a reference to the bridge itself.

use crate::model::ModelChoice;
use async_trait::async_trait;
use herd_core::{AgentKind, ExecutionMode, SessionId, TaskId};
use tokio::sync::mpsc;

/// Everything a spawner needs to run one task.
#[derive(Debug, Clone)]
pub struct TaskAssignment {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub agent_type: AgentKind,
    pub group_number: u32,
    pub model: ModelChoice,
    pub execution_mode: ExecutionMode,
    /// The spawner must refresh context before handing the task over.
    pub requires_fresh_context: bool,
}

/// Handle returned by a successful spawn.
#[derive(Debug, Clone, Default)]
pub struct SpawnedTask {
    /// Session backing the task, when one exists (session mode).
    pub session_id: Option<SessionId>,
}

/// Completion report for an assigned task.
#[derive(Debug)]
pub struct TaskCompletion {
    pub task_id: TaskId,
    pub result: Result<(), String>,
}

/// Capability for reporting task outcomes back to the bridge.
///
/// Cheap to clone; reports for tasks the bridge no longer tracks are
/// dropped on the floor.
#[derive(Debug, Clone)]
pub struct TaskReporter {
    tx: mpsc::UnboundedSender<TaskCompletion>,
}

impl TaskReporter {
    /// A reporter and the receiving end of its channel. The bridge owns
    /// one pair internally; standalone pairs serve spawner tests.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TaskCompletion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn mark_task_complete(&self, task_id: TaskId) {
        let _ = self.tx.send(TaskCompletion {
            task_id,
            result: Ok(()),
        });
    }

    pub fn mark_task_failed(&self, task_id: TaskId, error: impl Into<String>) {
        let _ = self.tx.send(TaskCompletion {
            task_id,
            result: Err(error.into()),
        });
    }
}

/// Launches tasks on behalf of the bridge.
#[async_trait]
pub trait TaskSpawner: Send + Sync + 'static {
    /// Spawn a fresh supervised session for the task. The spawner reports
    /// the task's eventual outcome through `reporter`.
    async fn spawn_session(
        &self,
        assignment: &TaskAssignment,
        reporter: TaskReporter,
    ) -> Result<SpawnedTask, String>;

    /// Run the task as an in-process lightweight call. `None` means the
    /// spawner does not support lightweight execution and the bridge falls
    /// back to session mode.
    async fn spawn_lightweight(
        &self,
        assignment: &TaskAssignment,
        reporter: TaskReporter,
    ) -> Option<Result<SpawnedTask, String>>;

    /// Advisory hard stop for an in-flight task. Implementations may
    /// ignore it; the bridge never waits on it.
    async fn abort(&self, task_id: &TaskId);
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBehaviour, FakeTaskSpawner};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Behaviour of the fake for one spawn call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FakeBehaviour {
        /// Report success immediately.
        CompleteImmediately,
        /// Report failure immediately.
        FailImmediately,
        /// Fail the spawn call itself.
        SpawnError,
        /// Spawn succeeds; the test reports completion later.
        Hold,
    }

    #[derive(Default)]
    struct FakeState {
        assignments: Vec<TaskAssignment>,
        reporters: HashMap<TaskId, TaskReporter>,
        behaviour: HashMap<TaskId, FakeBehaviour>,
        default_behaviour: Option<FakeBehaviour>,
        lightweight_supported: bool,
        lightweight_calls: usize,
        aborted: Vec<TaskId>,
    }

    /// Recording spawner for tests.
    #[derive(Clone, Default)]
    pub struct FakeTaskSpawner {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeTaskSpawner {
        /// Fake that completes every task immediately.
        pub fn completing() -> Self {
            let fake = Self::default();
            fake.state.lock().default_behaviour = Some(FakeBehaviour::CompleteImmediately);
            fake
        }

        /// Fake that holds every task until the test reports.
        pub fn holding() -> Self {
            let fake = Self::default();
            fake.state.lock().default_behaviour = Some(FakeBehaviour::Hold);
            fake
        }

        pub fn set_behaviour(&self, task_id: &TaskId, behaviour: FakeBehaviour) {
            self.state
                .lock()
                .behaviour
                .insert(task_id.clone(), behaviour);
        }

        pub fn support_lightweight(&self, supported: bool) {
            self.state.lock().lightweight_supported = supported;
        }

        pub fn assignments(&self) -> Vec<TaskAssignment> {
            self.state.lock().assignments.clone()
        }

        pub fn lightweight_calls(&self) -> usize {
            self.state.lock().lightweight_calls
        }

        pub fn aborted(&self) -> Vec<TaskId> {
            self.state.lock().aborted.clone()
        }

        /// Complete a held task.
        pub fn complete(&self, task_id: &TaskId) {
            let reporter = self.state.lock().reporters.get(task_id).cloned();
            if let Some(reporter) = reporter {
                reporter.mark_task_complete(task_id.clone());
            }
        }

        /// Fail a held task.
        pub fn fail(&self, task_id: &TaskId, error: &str) {
            let reporter = self.state.lock().reporters.get(task_id).cloned();
            if let Some(reporter) = reporter {
                reporter.mark_task_failed(task_id.clone(), error);
            }
        }

        fn run(
            &self,
            assignment: &TaskAssignment,
            reporter: TaskReporter,
        ) -> Result<SpawnedTask, String> {
            let behaviour = {
                let mut state = self.state.lock();
                state.assignments.push(assignment.clone());
                state
                    .reporters
                    .insert(assignment.task_id.clone(), reporter.clone());
                state
                    .behaviour
                    .get(&assignment.task_id)
                    .copied()
                    .or(state.default_behaviour)
                    .unwrap_or(FakeBehaviour::CompleteImmediately)
            };

            match behaviour {
                FakeBehaviour::CompleteImmediately => {
                    reporter.mark_task_complete(assignment.task_id.clone());
                    Ok(SpawnedTask::default())
                }
                FakeBehaviour::FailImmediately => {
                    reporter.mark_task_failed(assignment.task_id.clone(), "fake task failure");
                    Ok(SpawnedTask::default())
                }
                FakeBehaviour::SpawnError => Err("fake spawn error".to_string()),
                FakeBehaviour::Hold => Ok(SpawnedTask::default()),
            }
        }
    }

    #[async_trait]
    impl TaskSpawner for FakeTaskSpawner {
        async fn spawn_session(
            &self,
            assignment: &TaskAssignment,
            reporter: TaskReporter,
        ) -> Result<SpawnedTask, String> {
            self.run(assignment, reporter)
        }

        async fn spawn_lightweight(
            &self,
            assignment: &TaskAssignment,
            reporter: TaskReporter,
        ) -> Option<Result<SpawnedTask, String>> {
            if !self.state.lock().lightweight_supported {
                return None;
            }
            self.state.lock().lightweight_calls += 1;
            Some(self.run(assignment, reporter))
        }

        async fn abort(&self, task_id: &TaskId) {
            self.state.lock().aborted.push(task_id.clone());
        }
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
