// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-core: Core library for the herd orchestration core

pub mod agent;
pub mod clock;
pub mod id;
pub mod plan;
pub mod schedule;
pub mod session;
pub mod summary;
pub mod task;
pub mod terminal;
pub mod time_fmt;
pub mod timer;

pub use agent::AgentId;
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::ShortId;
pub use plan::{
    AgentKind, ExecutionGroup, ExecutionMode, GroupStatus, GroupTask, PlanItem, Schedule,
    ScheduleStatus, TaskStatus,
};
pub use schedule::{GroupScheduler, ScheduleError, ScheduleEvent};
pub use session::SessionId;
pub use summary::{
    EventSeverity, SummaryConfig, SummaryEvent, SummaryEventKind, SummaryStats, SummaryTracker,
};
pub use task::TaskId;
pub use terminal::{TerminalBuffer, CHUNK_SIZE, TRUNCATION_MARKER};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use timer::TimerId;
