// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The child's progress file (`comms/progress.json`).
//!
//! Children rewrite this file periodically; the parent polls it. Every
//! field defaults so a child that writes a sparse object still produces a
//! usable snapshot.

use serde::{Deserialize, Serialize};

/// One subtask line in a progress report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

/// Snapshot of a child agent's progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProgress {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub percent_complete: u8,
    #[serde(default)]
    pub current_action: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub files_modified: Vec<String>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub cost_so_far: f64,
    /// Epoch milliseconds of the child's last write.
    #[serde(default)]
    pub updated_at: u64,
}

impl AgentProgress {
    /// Parse a progress file body. Invalid JSON is an error; missing
    /// fields are not.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let mut progress: Self = serde_json::from_str(text)?;
        progress.percent_complete = progress.percent_complete.min(100);
        Ok(progress)
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
