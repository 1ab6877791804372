// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot probe runner.
//!
//! A probe asks the external assistant binary a single non-interactive
//! question about a session's terminal output. The probe runs in its own
//! detachable session, writes stdout+stderr to a temp file, and appends a
//! sentinel marker on its own line after the process exits. The runner
//! polls the file for the marker; the file-and-sentinel protocol survives
//! terminal buffering and probe crashes, which an in-process pipe would
//! not.
//!
//! Invariant: the temp file and the probe session are cleaned up on every
//! exit path, success or error.

use crate::env;
use crate::session::{generate_short_random, SessionAdapter};
use crate::shell::escape_for_shell_double_quotes;
use herd_core::SessionId;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from running a probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe spawn failed: {0}")]
    SpawnError(String),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("probe io error: {0}")]
    Io(String),
}

/// Static configuration for a probe runner.
#[derive(Debug, Clone)]
pub struct ProbeRunnerConfig {
    /// Assistant binary invoked non-interactively.
    pub binary: String,
    /// Prefix for probe session names and temp files.
    pub screen_prefix: String,
    /// Sentinel line appended to the output file when the probe exits.
    pub done_marker: String,
    /// Directory for probe output files.
    pub temp_dir: PathBuf,
    /// How often the output file is polled for the sentinel.
    pub poll_interval: Duration,
}

impl Default for ProbeRunnerConfig {
    fn default() -> Self {
        Self {
            binary: "claude".to_string(),
            // The session adapter adds its own process-wide prefix on top
            screen_prefix: "probe".to_string(),
            done_marker: "HERD_PROBE_DONE".to_string(),
            temp_dir: std::env::temp_dir(),
            poll_interval: env::probe_poll_interval(),
        }
    }
}

/// Runs one-shot probes in detachable sessions.
#[derive(Clone)]
pub struct ProbeRunner<S: SessionAdapter> {
    sessions: S,
    config: ProbeRunnerConfig,
}

impl<S: SessionAdapter> ProbeRunner<S> {
    pub fn new(sessions: S, config: ProbeRunnerConfig) -> Self {
        Self { sessions, config }
    }

    pub fn config(&self) -> &ProbeRunnerConfig {
        &self.config
    }

    /// Run one probe: spawn, poll for the sentinel, read the output,
    /// clean up.
    pub async fn run(
        &self,
        session_id: &SessionId,
        prompt: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<String, ProbeError> {
        let temp_file = self.config.temp_dir.join(format!(
            "{}-{}.out",
            self.config.screen_prefix,
            generate_short_random(8)
        ));
        let screen_name = format!(
            "{}-{}-{}",
            self.config.screen_prefix,
            session_id.short(8),
            generate_short_random(6)
        );

        let command = format!(
            "{} -p --model {} \"{}\" > {} 2>&1; echo {} >> {}",
            self.config.binary,
            model,
            escape_for_shell_double_quotes(prompt),
            temp_file.display(),
            self.config.done_marker,
            temp_file.display()
        );

        let spawned = self
            .sessions
            .spawn(&screen_name, &self.config.temp_dir, &command, &[])
            .await;
        let probe_session = match spawned {
            Ok(id) => id,
            Err(e) => {
                // Nothing was spawned, but a partial temp file may exist
                let _ = tokio::fs::remove_file(&temp_file).await;
                return Err(ProbeError::SpawnError(e.to_string()));
            }
        };

        tracing::debug!(
            session_id = %session_id,
            probe_session,
            temp_file = %temp_file.display(),
            "probe started"
        );

        let outcome = self.wait_for_marker(&temp_file, timeout).await;

        // Cleanup runs on every exit path
        let _ = tokio::fs::remove_file(&temp_file).await;
        let _ = self.sessions.kill(&probe_session).await;

        match &outcome {
            Ok(_) => tracing::debug!(probe_session, "probe completed"),
            Err(e) => tracing::warn!(probe_session, error = %e, "probe failed"),
        }
        outcome
    }

    /// Poll the output file until its last non-empty line equals the
    /// sentinel, then return the content with the sentinel line removed.
    async fn wait_for_marker(
        &self,
        temp_file: &std::path::Path,
        timeout: Duration,
    ) -> Result<String, ProbeError> {
        let started = Instant::now();
        loop {
            match tokio::fs::read_to_string(temp_file).await {
                Ok(content) => {
                    if let Some(output) = strip_marker(&content, &self.config.done_marker) {
                        return Ok(output);
                    }
                }
                // Not written yet; anything else is a real failure
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(ProbeError::Io(e.to_string())),
            }
            if started.elapsed() > timeout {
                return Err(ProbeError::Timeout(timeout));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

/// If the last non-empty line of `content` equals `marker` (after trimming
/// trailing whitespace), return the content with that line removed.
fn strip_marker(content: &str, marker: &str) -> Option<String> {
    let trimmed = content.trim_end();
    let last_line = trimmed.lines().next_back()?;
    if last_line.trim_end() != marker {
        return None;
    }
    let without = &trimmed[..trimmed.len() - last_line.len()];
    Some(without.trim_end().to_string())
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
