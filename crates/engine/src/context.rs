// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context refresh for running sessions.
//!
//! Issues the configured context-reset directive into a session on behalf
//! of a task that demands a fresh context. The directive string is pure
//! configuration — the engine knows nothing about the assistant binary's
//! command vocabulary.

use herd_adapters::{SessionAdapter, SessionError};
use herd_core::{SessionId, TerminalBuffer};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Context manager configuration.
#[derive(Debug, Clone)]
pub struct ContextManagerConfig {
    /// Directive written into the session, committed with Enter.
    pub directive: String,
}

impl Default for ContextManagerConfig {
    fn default() -> Self {
        Self {
            directive: "/clear".to_string(),
        }
    }
}

/// Outcome of a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Directive written and committed.
    Sent,
    /// A refresh for this session is already outstanding; nothing done.
    Pending,
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("session write failed: {0}")]
    Write(#[from] SessionError),
}

/// Issues context-reset directives, single-flight per session.
#[derive(Clone)]
pub struct ContextManager<S: SessionAdapter> {
    sessions: S,
    config: ContextManagerConfig,
    in_flight: Arc<Mutex<HashSet<SessionId>>>,
}

impl<S: SessionAdapter> ContextManager<S> {
    pub fn new(sessions: S, config: ContextManagerConfig) -> Self {
        Self {
            sessions,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Write the context-reset directive into `session_id`.
    ///
    /// Single-flight: a second call while one is outstanding returns
    /// [`RefreshOutcome::Pending`] immediately.
    pub async fn refresh_context(
        &self,
        session_id: &SessionId,
    ) -> Result<RefreshOutcome, RefreshError> {
        {
            let mut in_flight = self.in_flight.lock();
            if !in_flight.insert(session_id.clone()) {
                return Ok(RefreshOutcome::Pending);
            }
        }

        let result = self.write_directive(session_id).await;

        self.in_flight.lock().remove(session_id);

        result.map(|_| RefreshOutcome::Sent)
    }

    async fn write_directive(&self, session_id: &SessionId) -> Result<(), RefreshError> {
        tracing::info!(session_id = %session_id, "refreshing session context");

        // Large directives go through the chunked writer so the pty never
        // sees one oversized write.
        for chunk in TerminalBuffer::chunked(self.config.directive.as_bytes()) {
            let text = String::from_utf8_lossy(chunk);
            self.sessions
                .write_text(session_id.as_str(), &text)
                .await?;
        }
        self.sessions.press_enter(session_id.as_str()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
