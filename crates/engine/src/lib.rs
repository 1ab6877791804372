// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-engine: checker, model selection, context refresh, and the
//! execution bridge driving plan schedules.

pub mod bridge;
pub mod bus;
pub mod checker;
pub mod context;
pub mod model;
pub mod spawner;
pub mod timers;
pub mod watchdog;

pub use bridge::{
    BridgeError, BridgeEvent, BridgeStatus, ExecutionBridge, ExecutionRecord,
    EXECUTION_POLL_INTERVAL, GROUP_TIMEOUT, MAX_EXECUTION_HISTORY,
    MAX_PARALLEL_TASKS_PER_GROUP, MAX_TASK_RETRIES, TASK_RETRY_DELAY,
};
pub use bus::Broadcaster;
pub use checker::{
    AiChecker, CheckOutcome, CheckResult, CheckerConfig, CheckerEvent, CheckerSnapshot,
    CheckerStatus, VerdictDomain,
};
pub use context::{ContextManager, ContextManagerConfig, RefreshError, RefreshOutcome};
pub use model::{ModelChoice, ModelSelector, ModelSelectorConfig, ModelTier};
pub use spawner::{SpawnedTask, TaskAssignment, TaskCompletion, TaskReporter, TaskSpawner};
pub use watchdog::start_stuck_watchdog;

#[cfg(any(test, feature = "test-support"))]
pub use spawner::FakeTaskSpawner;
