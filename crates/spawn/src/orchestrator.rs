// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The spawn orchestrator: parent side of the child-agent protocol.
//!
//! `spawn()` parses a task spec, materialises the child's workspace and
//! comms directory, writes its instruction file, launches a supervised
//! session, then polls progress, messages, and the session's terminal
//! tail until the completion phrase appears, the child dies, or the
//! timeout elapses. Every terminal path kills the child's session;
//! workspace artifacts survive per the cleanup policy.

use crate::instruction::{initial_prompt, render_instructions};
use crate::session_spawner::AssistantCommand;
use crate::workspace::SpawnWorkspace;
use herd_adapters::{env, SessionAdapter};
use herd_core::{AgentId, Clock};
use herd_taskspec::{
    contains_completion, AgentProgress, AgentResult, FileChange, ResultParseError, ResultStatus,
    SpawnSpec, SpecError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Orchestrator limits and polling cadence.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Simultaneously running child agents.
    pub max_concurrent_agents: usize,
    /// How deep spawn chains may nest.
    pub max_spawn_depth: u32,
    pub progress_poll_interval: Duration,
    /// Keep the workspace around when the spawn fails, for post-mortems.
    pub keep_workspace_on_failure: bool,
    /// Command used to launch child sessions.
    pub command: AssistantCommand,
    /// Terminal lines scanned for the completion phrase each poll.
    pub terminal_tail_lines: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_agents: 5,
            max_spawn_depth: 3,
            progress_poll_interval: env::spawn_poll_interval(),
            keep_workspace_on_failure: true,
            command: AssistantCommand::default(),
            terminal_tail_lines: 200,
        }
    }
}

/// Terminal failure modes of a spawn.
#[derive(Debug, Error)]
pub enum SpawnFailure {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("spawn depth {depth} exceeds the maximum of {max}")]
    DepthExceeded { depth: u32, max: u32 },
    #[error("already running the maximum of {max} child agents")]
    ConcurrencyExceeded { max: usize },
    #[error("workspace setup failed: {0}")]
    Workspace(String),
    #[error("child launch failed: {0}")]
    Launch(String),
    #[error("child timed out after {minutes} minutes")]
    Timeout { minutes: u64 },
    #[error("child session ended without a completion signal: {0}")]
    ChildExited(String),
    #[error(transparent)]
    ResultParse(#[from] ResultParseError),
    #[error("child reported failure: {}", .0.summary)]
    ChildFailed(Box<AgentResult>),
}

/// Successful spawn outcome.
#[derive(Debug, Clone)]
pub struct SpawnResult {
    pub agent_id: AgentId,
    pub status: ResultStatus,
    pub summary: String,
    pub cost: Option<f64>,
    pub files_changed: Vec<FileChange>,
    /// The result file's narrative body.
    pub output: String,
    /// Last progress snapshot the child published.
    pub progress: AgentProgress,
    pub duration_ms: u64,
}

struct ActiveAgent {
    workspace: SpawnWorkspace,
    session_id: Option<String>,
}

/// Parent-side orchestrator for child agents.
pub struct SpawnOrchestrator<S: SessionAdapter, C: Clock> {
    sessions: S,
    clock: C,
    config: OrchestratorConfig,
    active: Arc<Mutex<HashMap<AgentId, ActiveAgent>>>,
}

impl<S: SessionAdapter, C: Clock> SpawnOrchestrator<S, C> {
    pub fn new(sessions: S, clock: C, config: OrchestratorConfig) -> Self {
        Self {
            sessions,
            clock,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Ids of currently running child agents.
    pub fn active_agents(&self) -> Vec<AgentId> {
        self.active.lock().keys().cloned().collect()
    }

    /// Spawn a child agent from a task spec document and supervise it to
    /// completion.
    pub async fn spawn(
        &self,
        spec_text: &str,
        parent_dir: &Path,
    ) -> Result<SpawnResult, SpawnFailure> {
        self.spawn_at_depth(spec_text, parent_dir, 0).await
    }

    /// Spawn at an explicit chain depth (a child spawning its own child
    /// passes its depth + 1).
    pub async fn spawn_at_depth(
        &self,
        spec_text: &str,
        parent_dir: &Path,
        depth: u32,
    ) -> Result<SpawnResult, SpawnFailure> {
        let spec = SpawnSpec::parse(spec_text)?;
        if depth >= self.config.max_spawn_depth {
            return Err(SpawnFailure::DepthExceeded {
                depth,
                max: self.config.max_spawn_depth,
            });
        }

        let workspace = SpawnWorkspace::at(parent_dir, &spec.agent_id);

        // Reserve a concurrency slot; released on every exit below.
        {
            let mut active = self.active.lock();
            if active.len() >= self.config.max_concurrent_agents {
                return Err(SpawnFailure::ConcurrencyExceeded {
                    max: self.config.max_concurrent_agents,
                });
            }
            if active.contains_key(&spec.agent_id) {
                return Err(SpawnFailure::Launch(format!(
                    "agent {} is already running",
                    spec.agent_id
                )));
            }
            active.insert(
                spec.agent_id.clone(),
                ActiveAgent {
                    workspace: workspace.clone(),
                    session_id: None,
                },
            );
        }

        let started_ms = self.clock.epoch_ms();
        let outcome = self.run_child(&spec, &workspace, parent_dir, depth).await;
        let duration_ms = self.clock.epoch_ms().saturating_sub(started_ms);

        // Teardown: session down, slot released, workspace per policy
        let session_id = {
            let mut active = self.active.lock();
            active.remove(&spec.agent_id).and_then(|a| a.session_id)
        };
        if let Some(session_id) = session_id {
            let _ = self.sessions.kill(&session_id).await;
        }
        let keep = outcome.is_err() && self.config.keep_workspace_on_failure;
        if !keep {
            let _ = tokio::fs::remove_dir_all(&workspace.root).await;
        }

        match outcome {
            Ok((result, progress)) => {
                tracing::info!(
                    agent_id = %spec.agent_id,
                    duration_ms,
                    "child agent completed"
                );
                Ok(SpawnResult {
                    agent_id: spec.agent_id,
                    status: result.status,
                    summary: result.summary,
                    cost: result.cost,
                    files_changed: result.files_changed,
                    output: result.body,
                    progress,
                    duration_ms,
                })
            }
            Err(failure) => {
                tracing::warn!(
                    agent_id = %spec.agent_id,
                    error = %failure,
                    workspace_kept = keep,
                    "child agent failed"
                );
                Err(failure)
            }
        }
    }

    /// Append a parent message into a running child's comms directory.
    pub async fn post_message(
        &self,
        agent_id: &AgentId,
        content: &str,
    ) -> Result<(), SpawnFailure> {
        let workspace = {
            let active = self.active.lock();
            active
                .get(agent_id)
                .map(|a| a.workspace.clone())
                .ok_or_else(|| SpawnFailure::Launch(format!("agent {} is not running", agent_id)))?
        };
        workspace
            .post_parent_message(content)
            .await
            .map_err(|e| SpawnFailure::Workspace(e.to_string()))?;
        Ok(())
    }

    /// Soft-cancel: ask the child to wind down through the message
    /// channel. The hard stop is `abort`.
    pub async fn request_cancel(&self, agent_id: &AgentId) -> Result<(), SpawnFailure> {
        self.post_message(
            agent_id,
            "CANCEL: stop working now. Write your result file with \
             `status: failed` and a summary of where you stopped, then \
             print your completion signal.",
        )
        .await
    }

    /// Hard stop: kill the child's session. The poll loop then observes
    /// the dead session and fails the spawn.
    pub async fn abort(&self, agent_id: &AgentId) {
        let session_id = {
            let active = self.active.lock();
            active.get(agent_id).and_then(|a| a.session_id.clone())
        };
        if let Some(session_id) = session_id {
            let _ = self.sessions.kill(&session_id).await;
        }
    }

    async fn run_child(
        &self,
        spec: &SpawnSpec,
        workspace: &SpawnWorkspace,
        parent_dir: &Path,
        depth: u32,
    ) -> Result<(AgentResult, AgentProgress), SpawnFailure> {
        workspace
            .create()
            .await
            .map_err(|e| SpawnFailure::Workspace(e.to_string()))?;

        let context_files = workspace
            .copy_context_files(spec, parent_dir)
            .await
            .map_err(|e| SpawnFailure::Workspace(e.to_string()))?;

        let instructions = render_instructions(spec, workspace, depth, &context_files);
        tokio::fs::write(workspace.instructions_path(), instructions)
            .await
            .map_err(|e| SpawnFailure::Workspace(e.to_string()))?;

        let command = self.config.command.build(None, &initial_prompt(spec, workspace));
        // The adapter owns naming and sanitisation; agent ids pass through
        // as-is.
        let session_name = format!("spawn-{}", spec.agent_id);
        let session_id = self
            .sessions
            .spawn(&session_name, &workspace.root, &command, &[])
            .await
            .map_err(|e| SpawnFailure::Launch(e.to_string()))?;
        if let Some(agent) = self.active.lock().get_mut(&spec.agent_id) {
            agent.session_id = Some(session_id.clone());
        }

        tracing::info!(
            agent_id = %spec.agent_id,
            session_id,
            depth,
            "child agent launched"
        );

        self.supervise(spec, workspace, &session_id).await
    }

    /// Poll loop: progress, messages, promise scan, liveness, timeout.
    async fn supervise(
        &self,
        spec: &SpawnSpec,
        workspace: &SpawnWorkspace,
        session_id: &str,
    ) -> Result<(AgentResult, AgentProgress), SpawnFailure> {
        let started_ms = self.clock.epoch_ms();
        let timeout_ms = spec.timeout_minutes * 60 * 1000;
        let mut progress = AgentProgress::default();
        let mut seen_messages = 0usize;

        loop {
            tokio::time::sleep(self.config.progress_poll_interval).await;

            if let Ok(text) = tokio::fs::read_to_string(workspace.progress_path()).await {
                match AgentProgress::parse(&text) {
                    Ok(p) => progress = p,
                    Err(e) => tracing::warn!(
                        agent_id = %spec.agent_id,
                        error = %e,
                        "ignoring malformed progress file"
                    ),
                }
            }

            let messages = workspace.scan_messages().await;
            for message in messages.iter().skip(seen_messages) {
                tracing::debug!(
                    agent_id = %spec.agent_id,
                    seq = message.seq,
                    author = ?message.author,
                    "new comms message"
                );
            }
            seen_messages = messages.len();

            if let Ok(tail) = self
                .sessions
                .capture_tail(session_id, self.config.terminal_tail_lines)
                .await
            {
                if contains_completion(&tail, &spec.completion_phrase) {
                    let result = self.ingest_result(workspace).await?;
                    return Ok((result, progress));
                }
            }

            let alive = self.sessions.is_alive(session_id).await.unwrap_or(false);
            if !alive {
                // The child may have finished and exited in the same poll
                // window; trust a well-formed result file over the race.
                return match self.ingest_result(workspace).await {
                    Ok(result) => Ok((result, progress)),
                    Err(failure @ SpawnFailure::ChildFailed(_)) => Err(failure),
                    Err(_) => Err(SpawnFailure::ChildExited(
                        "session died before the completion phrase".to_string(),
                    )),
                };
            }

            let elapsed = self.clock.epoch_ms().saturating_sub(started_ms);
            if elapsed >= timeout_ms {
                return Err(SpawnFailure::Timeout {
                    minutes: spec.timeout_minutes,
                });
            }
        }
    }

    async fn ingest_result(
        &self,
        workspace: &SpawnWorkspace,
    ) -> Result<AgentResult, SpawnFailure> {
        let text = tokio::fs::read_to_string(workspace.result_path())
            .await
            .map_err(|_| {
                SpawnFailure::ResultParse(ResultParseError::ParseFailed(
                    herd_taskspec::FrontmatterError::MissingFrontmatter,
                ))
            })?;
        let result = AgentResult::parse(&text)?;
        if result.status == ResultStatus::Failed {
            return Err(SpawnFailure::ChildFailed(Box::new(result)));
        }
        Ok(result)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
