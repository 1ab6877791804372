// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-backed task spawner for the execution bridge.
//!
//! Runs each assigned plan task in its own supervised session. The
//! supervising layer watches the session and reports the outcome through
//! the bridge's reporter; this spawner only launches and (on abort)
//! kills. Lightweight execution is not supported here — the bridge falls
//! back to session mode.

use async_trait::async_trait;
use herd_adapters::{escape_for_shell_double_quotes, SessionAdapter};
use herd_core::{SessionId, TaskId};
use herd_engine::{SpawnedTask, TaskAssignment, TaskReporter, TaskSpawner};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// How the assistant binary is invoked for a task or child agent.
#[derive(Debug, Clone)]
pub struct AssistantCommand {
    pub binary: String,
    /// Flags appended before the prompt.
    pub args: Vec<String>,
}

impl Default for AssistantCommand {
    fn default() -> Self {
        Self {
            binary: "claude".to_string(),
            args: Vec::new(),
        }
    }
}

impl AssistantCommand {
    /// Render the full shell command: binary, flags, optional model, and
    /// the double-quoted prompt.
    pub fn build(&self, model: Option<&str>, prompt: &str) -> String {
        let mut command = self.binary.clone();
        for arg in &self.args {
            command.push(' ');
            command.push_str(arg);
        }
        if let Some(model) = model {
            command.push_str(" --model ");
            command.push_str(model);
        }
        command.push_str(" \"");
        command.push_str(&escape_for_shell_double_quotes(prompt));
        command.push('"');
        command
    }
}

/// [`TaskSpawner`] that gives every task a fresh supervised session.
#[derive(Clone)]
pub struct SessionTaskSpawner<S: SessionAdapter> {
    sessions: S,
    command: AssistantCommand,
    workdir: PathBuf,
    running: Arc<Mutex<HashMap<TaskId, String>>>,
}

impl<S: SessionAdapter> SessionTaskSpawner<S> {
    pub fn new(sessions: S, command: AssistantCommand, workdir: PathBuf) -> Self {
        Self {
            sessions,
            command,
            workdir,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Session ids of tasks this spawner launched and has not aborted.
    pub fn running_sessions(&self) -> Vec<String> {
        self.running.lock().values().cloned().collect()
    }

    fn task_prompt(assignment: &TaskAssignment) -> String {
        if assignment.description.is_empty() {
            assignment.title.clone()
        } else {
            format!("{}\n\n{}", assignment.title, assignment.description)
        }
    }
}

#[async_trait]
impl<S: SessionAdapter> TaskSpawner for SessionTaskSpawner<S> {
    async fn spawn_session(
        &self,
        assignment: &TaskAssignment,
        _reporter: TaskReporter,
    ) -> Result<SpawnedTask, String> {
        let command = self
            .command
            .build(Some(&assignment.model.model), &Self::task_prompt(assignment));

        let session_name = format!("task-{}", assignment.task_id);
        let session_id = self
            .sessions
            .spawn(&session_name, &self.workdir, &command, &[])
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!(
            task_id = %assignment.task_id,
            session_id,
            model = assignment.model.model.as_str(),
            "task session spawned"
        );

        self.running
            .lock()
            .insert(assignment.task_id.clone(), session_id.clone());

        Ok(SpawnedTask {
            session_id: Some(SessionId::new(session_id)),
        })
    }

    async fn spawn_lightweight(
        &self,
        _assignment: &TaskAssignment,
        _reporter: TaskReporter,
    ) -> Option<Result<SpawnedTask, String>> {
        None
    }

    async fn abort(&self, task_id: &TaskId) {
        let session_id = self.running.lock().remove(task_id);
        if let Some(session_id) = session_id {
            tracing::info!(task_id = %task_id, session_id, "aborting task session");
            let _ = self.sessions.kill(&session_id).await;
        }
    }
}

#[cfg(test)]
#[path = "session_spawner_tests.rs"]
mod tests;
