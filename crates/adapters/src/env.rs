// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable overrides for polling intervals.
//!
//! Production defaults are conservative; integration tests dial them down
//! to milliseconds so loops converge quickly.

use std::time::Duration;

fn duration_ms_from_env(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// How often the probe runner polls its output file for the sentinel.
///
/// Override with `HERD_PROBE_POLL_MS`. Default: 500ms.
pub fn probe_poll_interval() -> Duration {
    duration_ms_from_env("HERD_PROBE_POLL_MS", 500)
}

/// How often spawn orchestration polls progress and the session tail.
///
/// Override with `HERD_SPAWN_POLL_MS`. Default: 5000ms.
pub fn spawn_poll_interval() -> Duration {
    duration_ms_from_env("HERD_SPAWN_POLL_MS", 5000)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
