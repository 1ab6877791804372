// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Ceiling on any single tmux invocation. Control commands finish in
/// milliseconds; anything slower means tmux itself is wedged and the
/// caller should hear about it rather than hang a poll loop.
pub const TMUX_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a command, giving up after `timeout`.
///
/// On expiry the error names `what` and the limit; the child is reaped
/// when the tokio `Child` is dropped.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    what: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => Err(format!(
            "{} did not finish within {}s",
            what,
            timeout.as_secs()
        )),
        Ok(Err(io_err)) => Err(format!("{}: {}", what, io_err)),
        Ok(Ok(output)) => Ok(output),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
