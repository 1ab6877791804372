// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI checker: turns a noisy terminal tail into a definitive verdict.
//!
//! One checker instance per verdict domain per session. Each `check()`
//! call snapshots the session's terminal tail, asks a one-shot probe, and
//! parses the first line of its answer into a verdict. Cooldowns pace the
//! probes; an error budget disables a checker that keeps failing, after
//! which it never performs I/O again.
//!
//! Calls on one checker are strictly serial — the state guard rejects a
//! second probe while one is in flight. Different checkers and sessions
//! are independent.

mod idle;
mod plan;

pub use idle::{idle_domain, IDLE_CHECK_DEFAULTS};
pub use plan::{plan_domain, PLAN_CHECK_DEFAULTS};

use crate::bus::Broadcaster;
use herd_adapters::{ProbeError, ProbeRunner, SessionAdapter};
use herd_core::{Clock, SessionId};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// Tuning for one checker instance.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub enabled: bool,
    /// Model the probe is invoked with.
    pub model: String,
    /// Terminal tail is truncated to this many characters.
    pub max_context_chars: usize,
    pub check_timeout: Duration,
    /// Cooldown after a verdict.
    pub cooldown: Duration,
    /// Cooldown after a parse failure, timeout, or spawn error.
    pub error_cooldown: Duration,
    /// Errors in a row before the checker disables itself.
    pub max_consecutive_errors: u32,
}

/// What a checker is asked to decide, and how.
#[derive(Debug, Clone)]
pub struct VerdictDomain {
    /// Short name used in logs ("idle-check", "plan-check").
    pub name: &'static str,
    pub positive_token: &'static str,
    pub negative_token: &'static str,
    /// Prompt template; `{output}` is replaced with the terminal tail.
    pub prompt_template: &'static str,
}

impl VerdictDomain {
    /// Case-insensitive verdict matcher, anchored at the start of the
    /// probe's first line: one token followed by a word boundary.
    #[allow(clippy::expect_used)]
    fn verdict_regex(&self) -> Regex {
        // Longest token first so a prefix token can never shadow it
        let (first, second) = if self.positive_token.len() >= self.negative_token.len() {
            (self.positive_token, self.negative_token)
        } else {
            (self.negative_token, self.positive_token)
        };
        Regex::new(&format!(r"(?i)^({}|{})\b", first, second))
            .expect("verdict tokens form a valid pattern")
    }
}

/// Checker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerStatus {
    Idle,
    Running,
    Cooldown,
    Disabled,
}

/// A parsed verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Upper-cased verdict token.
    pub verdict: String,
    /// Whether the verdict is the domain's positive token.
    pub positive: bool,
    /// Lines after the verdict line.
    pub reasoning: String,
    pub duration_ms: u64,
}

/// Outcome of one `check()` call.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Checker is running, cooling down, or not enabled for this call.
    Busy,
    /// Checker disabled itself; no I/O was performed.
    Disabled,
    Completed(CheckResult),
    Failed(String),
}

/// Events observed by checker subscribers, in order:
/// `Started → (Completed | Failed) → CooldownStarted → CooldownEnded`,
/// with `Disabled` fired exactly once if the checker gives up.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckerEvent {
    Started { session_id: SessionId },
    Completed { session_id: SessionId, result: CheckResult },
    Failed { session_id: SessionId, reason: String },
    CooldownStarted { session_id: SessionId, ends_at_ms: u64 },
    CooldownEnded { session_id: SessionId },
    Disabled { session_id: SessionId, reason: String },
}

#[derive(Debug)]
struct CheckerState {
    status: CheckerStatus,
    consecutive_errors: u32,
    cooldown_ends_at_ms: Option<u64>,
    last_result: Option<CheckResult>,
    last_run_started_at_ms: Option<u64>,
    runs_completed: u64,
}

/// Point-in-time view of checker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerSnapshot {
    pub status: CheckerStatus,
    pub consecutive_errors: u32,
    pub cooldown_ends_at_ms: Option<u64>,
    pub last_result: Option<CheckResult>,
    pub last_run_started_at_ms: Option<u64>,
    pub runs_completed: u64,
}

/// One verdict domain's checker for one session.
pub struct AiChecker<S: SessionAdapter, C: Clock> {
    session_id: SessionId,
    domain: VerdictDomain,
    config: CheckerConfig,
    verdict_regex: Regex,
    probe: ProbeRunner<S>,
    clock: C,
    state: Mutex<CheckerState>,
    events: Broadcaster<CheckerEvent>,
}

impl<S: SessionAdapter, C: Clock> AiChecker<S, C> {
    pub fn new(
        session_id: SessionId,
        domain: VerdictDomain,
        config: CheckerConfig,
        probe: ProbeRunner<S>,
        clock: C,
    ) -> Self {
        let verdict_regex = domain.verdict_regex();
        Self {
            session_id,
            domain,
            config,
            verdict_regex,
            probe,
            clock,
            state: Mutex::new(CheckerState {
                status: CheckerStatus::Idle,
                consecutive_errors: 0,
                cooldown_ends_at_ms: None,
                last_result: None,
                last_run_started_at_ms: None,
                runs_completed: 0,
            }),
            events: Broadcaster::default(),
        }
    }

    /// Subscribe to this checker's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<CheckerEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> CheckerSnapshot {
        let state = self.state.lock();
        CheckerSnapshot {
            status: state.status,
            consecutive_errors: state.consecutive_errors,
            cooldown_ends_at_ms: state.cooldown_ends_at_ms,
            last_result: state.last_result.clone(),
            last_run_started_at_ms: state.last_run_started_at_ms,
            runs_completed: state.runs_completed,
        }
    }

    pub fn status(&self) -> CheckerStatus {
        self.state.lock().status
    }

    /// Run one check over the session's terminal tail.
    ///
    /// Rejected with [`CheckOutcome::Busy`] unless the checker is idle; a
    /// disabled checker returns [`CheckOutcome::Disabled`] without I/O.
    pub async fn check(&self, terminal_tail: &str) -> CheckOutcome {
        let now_ms = self.clock.epoch_ms();

        // State guard: only an idle checker proceeds to I/O. Cooldown
        // expiry is observed here, keeping the machine tick-free.
        {
            let mut state = self.state.lock();
            if !self.config.enabled || state.status == CheckerStatus::Disabled {
                return CheckOutcome::Disabled;
            }
            if state.status == CheckerStatus::Cooldown {
                match state.cooldown_ends_at_ms {
                    Some(ends) if now_ms >= ends => {
                        state.status = CheckerStatus::Idle;
                        state.cooldown_ends_at_ms = None;
                        self.events.emit(CheckerEvent::CooldownEnded {
                            session_id: self.session_id.clone(),
                        });
                    }
                    _ => return CheckOutcome::Busy,
                }
            }
            if state.status != CheckerStatus::Idle {
                return CheckOutcome::Busy;
            }
            state.status = CheckerStatus::Running;
            state.last_run_started_at_ms = Some(now_ms);
        }

        self.events.emit(CheckerEvent::Started {
            session_id: self.session_id.clone(),
        });

        let context = tail_chars(terminal_tail, self.config.max_context_chars);
        let prompt = self.domain.prompt_template.replace("{output}", &context);

        let started = self.clock.epoch_ms();
        let probe_result = self
            .probe
            .run(
                &self.session_id,
                &prompt,
                &self.config.model,
                self.config.check_timeout,
            )
            .await;
        let duration_ms = self.clock.epoch_ms().saturating_sub(started);

        match probe_result {
            Ok(output) => self.settle_output(&output, duration_ms),
            Err(err) => self.settle_error(err),
        }
    }

    /// Parse the probe's answer and move to cooldown.
    fn settle_output(&self, output: &str, duration_ms: u64) -> CheckOutcome {
        if binary_missing(output, &self.probe.config().binary) {
            let reason = format!("{} binary not found", self.probe.config().binary);
            self.disable(&reason);
            return CheckOutcome::Failed(reason);
        }

        let (result, parsed) = self.parse_verdict(output, duration_ms);

        let mut state = self.state.lock();
        state.runs_completed += 1;
        state.last_result = Some(result.clone());
        let cooldown = if parsed {
            state.consecutive_errors = 0;
            self.config.cooldown
        } else {
            state.consecutive_errors += 1;
            self.config.error_cooldown
        };

        self.events.emit(CheckerEvent::Completed {
            session_id: self.session_id.clone(),
            result: result.clone(),
        });

        if state.consecutive_errors >= self.config.max_consecutive_errors {
            drop(state);
            self.disable("max consecutive errors");
            return CheckOutcome::Completed(result);
        }

        self.start_cooldown(&mut state, cooldown);
        CheckOutcome::Completed(result)
    }

    /// Record a probe failure and move to error cooldown.
    fn settle_error(&self, err: ProbeError) -> CheckOutcome {
        let reason = err.to_string();
        let mut state = self.state.lock();
        state.consecutive_errors += 1;

        self.events.emit(CheckerEvent::Failed {
            session_id: self.session_id.clone(),
            reason: reason.clone(),
        });

        if state.consecutive_errors >= self.config.max_consecutive_errors {
            drop(state);
            self.disable("max consecutive errors");
            return CheckOutcome::Failed(reason);
        }

        self.start_cooldown(&mut state, self.config.error_cooldown);
        CheckOutcome::Failed(reason)
    }

    /// Split the probe output into verdict and reasoning. An unparseable
    /// first line yields the negative verdict; the caller counts it
    /// against the error budget.
    fn parse_verdict(&self, output: &str, duration_ms: u64) -> (CheckResult, bool) {
        let mut lines = output.lines();
        let first = lines.next().unwrap_or("").trim();

        if let Some(caps) = self.verdict_regex.captures(first) {
            let verdict = caps[1].to_ascii_uppercase();
            let positive = verdict == self.domain.positive_token;
            let reasoning = lines.collect::<Vec<_>>().join("\n").trim().to_string();
            (
                CheckResult {
                    verdict,
                    positive,
                    reasoning,
                    duration_ms,
                },
                true,
            )
        } else {
            tracing::debug!(
                session_id = %self.session_id,
                domain = self.domain.name,
                first_line = first,
                "unparseable probe verdict, treating as negative"
            );
            (
                CheckResult {
                    verdict: self.domain.negative_token.to_string(),
                    positive: false,
                    reasoning: output.trim().to_string(),
                    duration_ms,
                },
                false,
            )
        }
    }

    fn start_cooldown(&self, state: &mut CheckerState, duration: Duration) {
        let ends_at_ms = self.clock.epoch_ms() + duration.as_millis() as u64;
        state.status = CheckerStatus::Cooldown;
        state.cooldown_ends_at_ms = Some(ends_at_ms);
        self.events.emit(CheckerEvent::CooldownStarted {
            session_id: self.session_id.clone(),
            ends_at_ms,
        });
    }

    /// Terminal transition; the `Disabled` event fires exactly once.
    fn disable(&self, reason: &str) {
        let mut state = self.state.lock();
        if state.status == CheckerStatus::Disabled {
            return;
        }
        state.status = CheckerStatus::Disabled;
        state.cooldown_ends_at_ms = None;
        tracing::warn!(
            session_id = %self.session_id,
            domain = self.domain.name,
            reason,
            "checker disabled"
        );
        self.events.emit(CheckerEvent::Disabled {
            session_id: self.session_id.clone(),
            reason: reason.to_string(),
        });
    }
}

/// Last `max_chars` characters of `text`, on a character boundary.
fn tail_chars(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}

/// Whether probe output indicates the assistant binary is absent.
fn binary_missing(output: &str, binary: &str) -> bool {
    let lower = output.to_lowercase();
    lower.contains("command not found") && lower.contains(&binary.to_lowercase())
        || lower.contains(&format!("{}: not found", binary.to_lowercase()))
}

#[cfg(test)]
#[path = "checker_tests.rs"]
mod tests;
