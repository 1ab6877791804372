// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-adapters: process-boundary adapters for the orchestration core.
//!
//! Everything that touches tmux, temp files, or subprocesses lives here,
//! behind traits so the engine and spawn crates stay testable with fakes.

pub mod env;
pub mod probe;
pub mod session;
pub mod shell;
pub mod subprocess;

pub use probe::{ProbeError, ProbeRunner, ProbeRunnerConfig};
pub use session::{
    generate_short_random, sanitize_session_name, SessionAdapter, SessionError, TmuxAdapter,
};
pub use shell::escape_for_shell_double_quotes;
pub use subprocess::run_with_timeout;

#[cfg(any(test, feature = "test-support"))]
pub use session::{FakeSession, FakeSessionAdapter, SessionCall};
