// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detachable terminal session adapters

mod tmux;

pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSession, FakeSessionAdapter, SessionCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for detachable terminal sessions.
///
/// The surface is exactly what the orchestration core does to a session:
/// spawn it detached, type into it (directives, injected prompts), commit
/// with Enter, read its recent output (verdict probes, completion-phrase
/// scans), check it is still there, and tear it down. The adapter owns
/// session naming; callers treat the returned id as opaque.
#[async_trait]
pub trait SessionAdapter: Clone + Send + Sync + 'static {
    /// Spawn a detached session running `cmd` in `cwd`, returning its id
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, SessionError>;

    /// Type literal text into a session, without submitting it
    async fn write_text(&self, id: &str, text: &str) -> Result<(), SessionError>;

    /// Press Enter in a session, submitting whatever was typed
    async fn press_enter(&self, id: &str) -> Result<(), SessionError>;

    /// The last `lines` lines of a session's output
    async fn capture_tail(&self, id: &str, lines: u32) -> Result<String, SessionError>;

    /// Check if a session is alive
    async fn is_alive(&self, id: &str) -> Result<bool, SessionError>;

    /// Kill a session. Killing a session that is already gone is not an
    /// error.
    async fn kill(&self, id: &str) -> Result<(), SessionError>;
}

/// Sanitize a string for use in tmux session names.
///
/// tmux session names cannot contain: colon `:`, period `.`
/// Also replaces other problematic characters for shell friendliness.
pub fn sanitize_session_name(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect();

    // Collapse multiple hyphens and trim
    let collapsed = sanitized
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if collapsed.len() <= max_len {
        collapsed
    } else {
        collapsed[..max_len].trim_end_matches('-').to_string()
    }
}

/// Generate a short random hex string.
pub fn generate_short_random(len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..len)
        .map(|_| format!("{:x}", rng.random::<u8>() % 16))
        .collect()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
