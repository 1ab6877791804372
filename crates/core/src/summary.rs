// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session run summary: bounded event log plus aggregate stats.
//!
//! Pure state, no I/O. The 60-second state-stuck watchdog loop lives in the
//! engine; it drives [`SummaryTracker::check_state_stuck`] and forwards the
//! warning it returns.

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Events kept before trimming kicks in.
pub const MAX_EVENTS: usize = 1000;

/// Events kept after a trim (oldest dropped first).
pub const TRIM_EVENTS: usize = 800;

/// A `token_milestone` event fires each time the floor of
/// `total / TOKEN_MILESTONE_STEP` advances.
pub const TOKEN_MILESTONE_STEP: u64 = 50_000;

/// How long a state may be held before the watchdog warns.
pub const STATE_STUCK_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// How often the engine-side watchdog checks for stuck states.
pub const STATE_STUCK_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Severity of a summary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// Kind of a summary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryEventKind {
    StateChange,
    TokenMilestone,
    StateStuck,
    RespawnCycle,
    AiCheck,
    Note,
}

/// A single entry in the per-session event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEvent {
    pub id: u64,
    pub timestamp_ms: u64,
    pub kind: SummaryEventKind,
    pub severity: EventSeverity,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// Aggregated counters for a session's run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_respawn_cycles: u64,
    pub state_transitions: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Largest single `record_tokens` delta seen.
    pub peak_tokens: u64,
    pub warning_count: u64,
    pub error_count: u64,
    pub ai_check_count: u64,
    pub total_time_active_ms: u64,
    pub total_time_idle_ms: u64,
}

impl SummaryStats {
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}

/// Names of the two supervisor states the tracker treats specially.
///
/// The supervising controller owns the state vocabulary; the tracker only
/// needs to know which state opens a respawn cycle and which one closes it.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub respawn_state: String,
    pub watching_state: String,
    pub stuck_threshold: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            respawn_state: "respawning".to_string(),
            watching_state: "watching".to_string(),
            stuck_threshold: STATE_STUCK_THRESHOLD,
        }
    }
}

/// Per-session run summary tracker. Single writer per session.
#[derive(Debug)]
pub struct SummaryTracker {
    session_id: SessionId,
    session_name: String,
    config: SummaryConfig,
    started_at_ms: u64,
    last_updated_at_ms: u64,
    events: Vec<SummaryEvent>,
    next_event_id: u64,
    stats: SummaryStats,
    current_state: Option<String>,
    state_entered_at_ms: u64,
    stuck_warned: bool,
    respawn_cycle_open: bool,
    /// Whether the session is currently counted as active (working).
    active: Option<bool>,
    last_flip_ms: u64,
}

impl SummaryTracker {
    pub fn new(
        session_id: SessionId,
        session_name: impl Into<String>,
        config: SummaryConfig,
        now_ms: u64,
    ) -> Self {
        Self {
            session_id,
            session_name: session_name.into(),
            config,
            started_at_ms: now_ms,
            last_updated_at_ms: now_ms,
            events: Vec::new(),
            next_event_id: 1,
            stats: SummaryStats::default(),
            current_state: None,
            state_entered_at_ms: now_ms,
            stuck_warned: false,
            respawn_cycle_open: false,
            active: None,
            last_flip_ms: now_ms,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn last_updated_at_ms(&self) -> u64 {
        self.last_updated_at_ms
    }

    pub fn stats(&self) -> &SummaryStats {
        &self.stats
    }

    pub fn events(&self) -> &[SummaryEvent] {
        &self.events
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    /// Append an event, trimming the log to [`TRIM_EVENTS`] when it grows
    /// past [`MAX_EVENTS`]. Warning/error severities bump their counters.
    pub fn add_event(
        &mut self,
        kind: SummaryEventKind,
        severity: EventSeverity,
        title: impl Into<String>,
        details: Option<String>,
        now_ms: u64,
    ) -> u64 {
        let id = self.next_event_id;
        self.next_event_id += 1;
        match severity {
            EventSeverity::Warning => self.stats.warning_count += 1,
            EventSeverity::Error => self.stats.error_count += 1,
            _ => {}
        }
        self.events.push(SummaryEvent {
            id,
            timestamp_ms: now_ms,
            kind,
            severity,
            title: title.into(),
            details,
            metadata: HashMap::new(),
        });
        if self.events.len() > MAX_EVENTS {
            let excess = self.events.len() - TRIM_EVENTS;
            self.events.drain(..excess);
        }
        self.last_updated_at_ms = now_ms;
        id
    }

    /// Record a supervisor state transition. Duplicate transitions are
    /// ignored. Entering the respawn state opens a respawn cycle; returning
    /// to the watching state closes it and bumps the cycle counter.
    pub fn record_state_change(&mut self, new_state: &str, now_ms: u64) {
        if self.current_state.as_deref() == Some(new_state) {
            return;
        }
        self.stats.state_transitions += 1;

        if new_state == self.config.respawn_state {
            self.respawn_cycle_open = true;
        } else if new_state == self.config.watching_state && self.respawn_cycle_open {
            self.respawn_cycle_open = false;
            self.stats.total_respawn_cycles += 1;
            self.add_event(
                SummaryEventKind::RespawnCycle,
                EventSeverity::Success,
                format!("respawn cycle {} complete", self.stats.total_respawn_cycles),
                None,
                now_ms,
            );
        }

        let title = match &self.current_state {
            Some(old) => format!("state {} -> {}", old, new_state),
            None => format!("state -> {}", new_state),
        };
        self.current_state = Some(new_state.to_string());
        self.state_entered_at_ms = now_ms;
        self.stuck_warned = false;
        self.add_event(SummaryEventKind::StateChange, EventSeverity::Info, title, None, now_ms);
    }

    /// Record token usage. Emits a `token_milestone` event whenever the
    /// floor of `total / 50 000` advances.
    pub fn record_tokens(&mut self, input: u64, output: u64, now_ms: u64) {
        let before = self.stats.total_tokens() / TOKEN_MILESTONE_STEP;
        self.stats.total_input_tokens += input;
        self.stats.total_output_tokens += output;
        let delta = input + output;
        if delta > self.stats.peak_tokens {
            self.stats.peak_tokens = delta;
        }
        let after = self.stats.total_tokens() / TOKEN_MILESTONE_STEP;
        if after > before {
            let total = self.stats.total_tokens();
            self.add_event(
                SummaryEventKind::TokenMilestone,
                EventSeverity::Info,
                format!("{} tokens used", after * TOKEN_MILESTONE_STEP),
                Some(format!("total {}", total)),
                now_ms,
            );
        }
        self.last_updated_at_ms = now_ms;
    }

    /// Count one AI checker run against this session.
    pub fn record_ai_check(&mut self, now_ms: u64) {
        self.stats.ai_check_count += 1;
        self.last_updated_at_ms = now_ms;
    }

    /// Session went idle: close out the active interval.
    pub fn record_idle(&mut self, now_ms: u64) {
        self.flip_activity(false, now_ms);
    }

    /// Session started working: close out the idle interval.
    pub fn record_working(&mut self, now_ms: u64) {
        self.flip_activity(true, now_ms);
    }

    fn flip_activity(&mut self, active: bool, now_ms: u64) {
        if self.active == Some(active) {
            return;
        }
        let elapsed = now_ms.saturating_sub(self.last_flip_ms);
        match self.active {
            Some(true) => self.stats.total_time_active_ms += elapsed,
            Some(false) => self.stats.total_time_idle_ms += elapsed,
            None => {}
        }
        self.active = Some(active);
        self.last_flip_ms = now_ms;
        self.last_updated_at_ms = now_ms;
    }

    /// Watchdog hook: if the current state has been held past the stuck
    /// threshold and no warning has fired for this entry yet, emit one.
    /// Cleared by the next state change.
    pub fn check_state_stuck(&mut self, now_ms: u64) -> Option<u64> {
        let state = self.current_state.clone()?;
        if self.stuck_warned {
            return None;
        }
        let held = now_ms.saturating_sub(self.state_entered_at_ms);
        if held < self.config.stuck_threshold.as_millis() as u64 {
            return None;
        }
        self.stuck_warned = true;
        let id = self.add_event(
            SummaryEventKind::StateStuck,
            EventSeverity::Warning,
            format!("state {} held for {}", state, crate::time_fmt::format_elapsed_ms(held)),
            None,
            now_ms,
        );
        Some(id)
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
