// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux session adapter.
//!
//! Sessions are created under a process-wide prefix (`herd-` by default)
//! so shutdown and cleanup can scope themselves to sessions this process
//! created. Names are sanitized here, not by callers: agent and task ids
//! come straight out of user-authored documents and may contain
//! characters tmux rejects in session names.

use super::{sanitize_session_name, SessionAdapter, SessionError};
use crate::subprocess::{run_with_timeout, TMUX_COMMAND_TIMEOUT};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Longest sanitized name before the prefix is attached.
const MAX_NAME_LEN: usize = 48;

/// Tmux-based session adapter
#[derive(Clone)]
pub struct TmuxAdapter {
    prefix: String,
}

impl Default for TmuxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TmuxAdapter {
    pub fn new() -> Self {
        Self {
            prefix: "herd".to_string(),
        }
    }

    /// Adapter whose sessions live under a different namespace (parallel
    /// test runs use this to stay out of each other's way).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Full session id for a caller-supplied name.
    fn scoped_id(&self, name: &str) -> String {
        format!("{}-{}", self.prefix, sanitize_session_name(name, MAX_NAME_LEN))
    }

    /// Run one tmux command under the shared subprocess timeout.
    async fn tmux<I, A>(&self, args: I, what: &str) -> Result<Output, SessionError>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        run_with_timeout(cmd, TMUX_COMMAND_TIMEOUT, what)
            .await
            .map_err(SessionError::CommandFailed)
    }

    /// Map a targeted command's failure to NotFound: tmux reports a bad
    /// `-t` target as a non-zero exit.
    fn target_result(output: Output, id: &str) -> Result<Output, SessionError> {
        if output.status.success() {
            Ok(output)
        } else {
            Err(SessionError::NotFound(id.to_string()))
        }
    }

    async fn session_exists(&self, id: &str) -> bool {
        self.tmux(["has-session", "-t", id], "tmux has-session")
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl SessionAdapter for TmuxAdapter {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, SessionError> {
        if !cwd.is_dir() {
            return Err(SessionError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let id = self.scoped_id(name);

        // A leftover session under this id is stale state from an earlier
        // run (respawn cycles reuse names); replace it.
        if self.session_exists(&id).await {
            tracing::warn!(session_id = id.as_str(), "replacing stale session");
            let _ = self.tmux(["kill-session", "-t", &id], "tmux kill-session").await;
        }

        let mut args: Vec<&OsStr> = vec![
            "new-session".as_ref(),
            "-d".as_ref(),
            "-s".as_ref(),
            id.as_ref(),
            "-c".as_ref(),
            cwd.as_os_str(),
        ];
        let env_flags: Vec<String> = env
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        for flag in &env_flags {
            args.push("-e".as_ref());
            args.push(flag.as_ref());
        }
        args.push(cmd.as_ref());

        let output = self.tmux(args, "tmux new-session").await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(session_id = id.as_str(), stderr = stderr.as_str(), "tmux spawn failed");
            return Err(SessionError::SpawnFailed(stderr));
        }
        if !output.stderr.is_empty() {
            tracing::warn!(
                session_id = id.as_str(),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "tmux spawn stderr (non-fatal)"
            );
        }

        Ok(id)
    }

    async fn write_text(&self, id: &str, text: &str) -> Result<(), SessionError> {
        // `-l` sends the bytes as typed instead of interpreting key names;
        // `--` keeps text that starts with a dash out of flag parsing.
        let output = self
            .tmux(["send-keys", "-t", id, "-l", "--", text], "tmux send-keys -l")
            .await?;
        Self::target_result(output, id).map(|_| ())
    }

    async fn press_enter(&self, id: &str) -> Result<(), SessionError> {
        let output = self
            .tmux(["send-keys", "-t", id, "Enter"], "tmux send-keys Enter")
            .await?;
        Self::target_result(output, id).map(|_| ())
    }

    async fn capture_tail(&self, id: &str, lines: u32) -> Result<String, SessionError> {
        // `-J` re-joins lines the pane wrapped at its width. Completion
        // signals and probe verdicts are matched as literals against this
        // text, so a wrap must never split them.
        let start = format!("-{}", lines);
        let output = self
            .tmux(
                ["capture-pane", "-t", id, "-p", "-J", "-S", start.as_str()],
                "tmux capture-pane",
            )
            .await?;
        let output = Self::target_result(output, id)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn is_alive(&self, id: &str) -> Result<bool, SessionError> {
        let output = self.tmux(["has-session", "-t", id], "tmux has-session").await?;
        Ok(output.status.success())
    }

    async fn kill(&self, id: &str) -> Result<(), SessionError> {
        // Best effort. The session being gone already is the common case
        // on teardown, and a missing tmux means there is nothing to kill.
        if let Err(e) = self.tmux(["kill-session", "-t", id], "tmux kill-session").await {
            tracing::debug!(session_id = id, error = %e, "kill-session skipped");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
