// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The child's result file (`comms/result.md`).
//!
//! Frontmatter carries the verdict and a short summary; the body is the
//! child's free-form output. A malformed document is a
//! [`ResultParseError`] — the orchestrator reports it as a distinct
//! failure mode rather than guessing.

use crate::frontmatter::{Document, FrontmatterError, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a result file.
#[derive(Debug, Error, PartialEq)]
pub enum ResultParseError {
    #[error("result parse failed: {0}")]
    ParseFailed(#[from] FrontmatterError),
    #[error("result has no status field")]
    MissingStatus,
    #[error("unknown result status: {0}")]
    UnknownStatus(String),
}

/// Terminal verdict of a child agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Failed,
}

/// Action taken on one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Created,
    #[default]
    Modified,
    Deleted,
}

impl FileAction {
    fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "deleted" => Self::Deleted,
            _ => Self::Modified,
        }
    }
}

/// One entry of the result's `filesChanged` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub action: FileAction,
    #[serde(default)]
    pub summary: String,
}

/// A parsed result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub status: ResultStatus,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_changed: Vec<FileChange>,
    /// Free-form narrative output.
    #[serde(default)]
    pub body: String,
}

impl AgentResult {
    pub fn parse(text: &str) -> Result<Self, ResultParseError> {
        let doc = Document::parse(text)?;

        let status = match doc.get("status").and_then(Value::coerce_string) {
            None => return Err(ResultParseError::MissingStatus),
            Some(s) => match s.trim().to_ascii_lowercase().as_str() {
                "completed" => ResultStatus::Completed,
                "failed" => ResultStatus::Failed,
                other => return Err(ResultParseError::UnknownStatus(other.to_string())),
            },
        };

        let summary = doc
            .get("summary")
            .and_then(Value::coerce_string)
            .unwrap_or_default();

        let cost = doc.get("cost").and_then(Value::as_f64);

        // filesChanged items are inline maps: `- {path: a, action: created}`
        // or plain paths, which default to `modified`.
        let files_changed = doc
            .get("filesChanged")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Map(entries) => {
                            let get = |key: &str| {
                                entries
                                    .iter()
                                    .find(|(k, _)| k == key)
                                    .and_then(|(_, v)| v.coerce_string())
                            };
                            Some(FileChange {
                                path: get("path")?,
                                action: get("action")
                                    .map(|a| FileAction::parse_lossy(&a))
                                    .unwrap_or_default(),
                                summary: get("summary").unwrap_or_default(),
                            })
                        }
                        other => other.coerce_string().map(|path| FileChange {
                            path,
                            action: FileAction::default(),
                            summary: String::new(),
                        }),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            status,
            summary,
            cost,
            files_changed,
            body: doc.body.trim().to_string(),
        })
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
