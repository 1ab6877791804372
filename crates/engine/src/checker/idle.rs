// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idle-check instantiation: is the session waiting for input, or working?

use super::{AiChecker, CheckerConfig, VerdictDomain};
use herd_adapters::{ProbeRunner, SessionAdapter};
use herd_core::{Clock, SessionId};
use std::time::Duration;

/// Defaults for the idle checker: 90s probe timeout, 180s cooldown after a
/// verdict, 60s after an error, 16 000 chars of context, 3 errors to
/// disable.
pub const IDLE_CHECK_DEFAULTS: IdleCheckDefaults = IdleCheckDefaults {
    check_timeout: Duration::from_secs(90),
    cooldown: Duration::from_secs(180),
    error_cooldown: Duration::from_secs(60),
    max_context_chars: 16_000,
    max_consecutive_errors: 3,
};

#[derive(Debug, Clone, Copy)]
pub struct IdleCheckDefaults {
    pub check_timeout: Duration,
    pub cooldown: Duration,
    pub error_cooldown: Duration,
    pub max_context_chars: usize,
    pub max_consecutive_errors: u32,
}

const IDLE_PROMPT: &str = "\
You are monitoring the terminal of an interactive CLI assistant session.
Decide whether the assistant is idle (finished, showing a prompt, waiting
for the user) or still working (streaming output, running tools, thinking).

Answer on the first line with exactly one word: IDLE or WORKING.
On the following lines, briefly say what in the output decided it.

Terminal output:
{output}";

/// The idle verdict domain.
pub fn idle_domain() -> VerdictDomain {
    VerdictDomain {
        name: "idle-check",
        positive_token: "IDLE",
        negative_token: "WORKING",
        prompt_template: IDLE_PROMPT,
    }
}

impl<S: SessionAdapter, C: Clock> AiChecker<S, C> {
    /// Idle checker for a session, with the standard defaults.
    pub fn idle(
        session_id: SessionId,
        model: impl Into<String>,
        probe: ProbeRunner<S>,
        clock: C,
    ) -> Self {
        let d = IDLE_CHECK_DEFAULTS;
        Self::new(
            session_id,
            idle_domain(),
            CheckerConfig {
                enabled: true,
                model: model.into(),
                max_context_chars: d.max_context_chars,
                check_timeout: d.check_timeout,
                cooldown: d.cooldown,
                error_cooldown: d.error_cooldown,
                max_consecutive_errors: d.max_consecutive_errors,
            },
            probe,
            clock,
        )
    }
}
