// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loop directive frontmatter for the supervising layer.
//!
//! The supervising controller re-prompts a session in a bounded loop; the
//! loop's state travels as frontmatter on the instruction document. The
//! parse is maximally forgiving: unrecognised numerics fall back to `0`
//! for the iteration counter and unlimited for the cap.

use crate::frontmatter::{Document, Value};
use crate::spec::canonical_phrase;
use serde::{Deserialize, Serialize};

/// Parsed loop directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct LoopMeta {
    pub enabled: bool,
    pub iteration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_promise: Option<String>,
}

impl LoopMeta {
    /// Parse the loop keys out of a frontmatter document. A document
    /// without frontmatter yields the disabled default.
    pub fn parse(text: &str) -> Self {
        let Ok(doc) = Document::parse(text) else {
            return Self::default();
        };
        Self::from_document(&doc)
    }

    pub fn from_document(doc: &Document) -> Self {
        let enabled = doc.get("enabled").and_then(Value::as_bool).unwrap_or(false);

        let iteration = doc
            .get("iteration")
            .and_then(Value::as_i64)
            .filter(|n| *n >= 0)
            .map(|n| n as u64)
            .unwrap_or(0);

        let max_iterations = doc
            .get("max-iterations")
            .and_then(Value::as_i64)
            .filter(|n| *n > 0)
            .map(|n| n as u64);

        let completion_promise = doc
            .get("completion-promise")
            .and_then(Value::coerce_string)
            .filter(|s| !s.trim().is_empty())
            .map(|s| canonical_phrase(&s));

        Self {
            enabled,
            iteration,
            max_iterations,
            completion_promise,
        }
    }

    /// Whether another iteration may run.
    pub fn may_continue(&self) -> bool {
        self.enabled
            && self
                .max_iterations
                .is_none_or(|max| self.iteration < max)
    }
}

#[cfg(test)]
#[path = "loop_meta_tests.rs"]
mod tests;
