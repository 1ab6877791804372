// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan-check instantiation: is the session sitting in plan mode?

use super::{AiChecker, CheckerConfig, VerdictDomain};
use herd_adapters::{ProbeRunner, SessionAdapter};
use herd_core::{Clock, SessionId};
use std::time::Duration;

/// Defaults for the plan checker: 60s probe timeout, 30s cooldowns,
/// 8 000 chars of context, 3 errors to disable.
pub const PLAN_CHECK_DEFAULTS: PlanCheckDefaults = PlanCheckDefaults {
    check_timeout: Duration::from_secs(60),
    cooldown: Duration::from_secs(30),
    error_cooldown: Duration::from_secs(30),
    max_context_chars: 8_000,
    max_consecutive_errors: 3,
};

#[derive(Debug, Clone, Copy)]
pub struct PlanCheckDefaults {
    pub check_timeout: Duration,
    pub cooldown: Duration,
    pub error_cooldown: Duration,
    pub max_context_chars: usize,
    pub max_consecutive_errors: u32,
}

const PLAN_PROMPT: &str = "\
You are monitoring the terminal of an interactive CLI assistant session.
Decide whether the assistant is currently presenting a plan for approval
(plan mode) or doing anything else.

Answer on the first line with exactly one word: PLAN_MODE or NOT_PLAN_MODE.
On the following lines, briefly say what in the output decided it.

Terminal output:
{output}";

/// The plan-mode verdict domain.
pub fn plan_domain() -> VerdictDomain {
    VerdictDomain {
        name: "plan-check",
        positive_token: "PLAN_MODE",
        negative_token: "NOT_PLAN_MODE",
        prompt_template: PLAN_PROMPT,
    }
}

impl<S: SessionAdapter, C: Clock> AiChecker<S, C> {
    /// Plan checker for a session, with the standard defaults.
    pub fn plan(
        session_id: SessionId,
        model: impl Into<String>,
        probe: ProbeRunner<S>,
        clock: C,
    ) -> Self {
        let d = PLAN_CHECK_DEFAULTS;
        Self::new(
            session_id,
            plan_domain(),
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
