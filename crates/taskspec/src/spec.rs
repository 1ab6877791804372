// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The spawn task spec: the document a parent writes to describe a child
//! agent's task.
//!
//! Header fields all have defaults; unknown enum values fall back to their
//! defaults rather than rejecting, so a parent running a newer vocabulary
//! never strands a child. Only a missing frontmatter block is an error.

use crate::frontmatter::{quote_if_needed, Document, FrontmatterError, Value};
use herd_core::{AgentId, AgentKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum agent name length; longer names are truncated.
pub const MAX_NAME_LEN: usize = 80;

/// Default child timeout in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 30;

/// Hard cap on the child timeout.
pub const MAX_TIMEOUT_MINUTES: u64 = 120;

/// Default progress reporting interval in seconds (0 disables).
pub const DEFAULT_PROGRESS_INTERVAL_SECONDS: u64 = 30;

/// Errors from parsing a spawn spec.
#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("spec parse failed: {0}")]
    ParseFailed(#[from] FrontmatterError),
}

/// Priority hint for a spawned agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// How the child delivers its result back to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultDelivery {
    File,
    Stdout,
    #[default]
    Both,
}

impl ResultDelivery {
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Both,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Stdout => "stdout",
            Self::Both => "both",
        }
    }
}

/// Output format the child is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Structured,
    Json,
}

impl OutputFormat {
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" => Self::Structured,
            "json" => Self::Json,
            _ => Self::Markdown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Structured => "structured",
            Self::Json => "json",
        }
    }
}

/// A parsed spawn task spec: header fields plus free-form instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnSpec {
    pub agent_id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    pub priority: Priority,
    pub can_modify_parent_files: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
    pub timeout_minutes: u64,
    pub result_delivery: ResultDelivery,
    pub completion_phrase: String,
    pub progress_interval_seconds: u64,
    pub output_format: OutputFormat,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,
    /// Free-form task instructions (the document body).
    pub instructions: String,
}

impl SpawnSpec {
    /// Parse a spec document, applying defaults, truncation, and lossy
    /// enum fallback.
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let doc = Document::parse(text)?;

        let agent_id = match doc.get("agentId").and_then(Value::coerce_string) {
            Some(id) if !id.trim().is_empty() => AgentId::new(id.trim()),
            _ => AgentId::generate(),
        };

        let name = doc
            .get("name")
            .and_then(Value::coerce_string)
            .unwrap_or_else(|| agent_id.to_string());
        let name: String = name.chars().take(MAX_NAME_LEN).collect();

        let kind = doc
            .get("type")
            .and_then(Value::coerce_string)
            .map(|s| AgentKind::parse_lossy(&s))
            .unwrap_or_default();

        let priority = doc
            .get("priority")
            .and_then(Value::coerce_string)
            .map(|s| Priority::parse_lossy(&s))
            .unwrap_or_default();

        let can_modify_parent_files = doc
            .get("canModifyParentFiles")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let max_tokens = doc
            .get("maxTokens")
            .and_then(Value::as_i64)
            .filter(|n| *n >= 0)
            .map(|n| n as u64);

        let max_cost = doc.get("maxCost").and_then(Value::as_f64);

        let timeout_minutes = doc
            .get("timeoutMinutes")
            .and_then(Value::as_i64)
            .filter(|n| *n > 0)
            .map(|n| (n as u64).min(MAX_TIMEOUT_MINUTES))
            .unwrap_or(DEFAULT_TIMEOUT_MINUTES);

        let result_delivery = doc
            .get("resultDelivery")
            .and_then(Value::coerce_string)
            .map(|s| ResultDelivery::parse_lossy(&s))
            .unwrap_or_default();

        let completion_phrase = doc
            .get("completionPhrase")
            .and_then(Value::coerce_string)
            .filter(|s| !s.trim().is_empty())
            .map(|s| canonical_phrase(&s))
            .unwrap_or_else(|| default_completion_phrase(&agent_id));

        let progress_interval_seconds = doc
            .get("progressIntervalSeconds")
            .and_then(Value::as_i64)
            .filter(|n| *n >= 0)
            .map(|n| n as u64)
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL_SECONDS);

        let output_format = doc
            .get("outputFormat")
            .and_then(Value::coerce_string)
            .map(|s| OutputFormat::parse_lossy(&s))
            .unwrap_or_default();

        let context_files = doc
            .get("contextFiles")
            .map(Value::string_items)
            .unwrap_or_default();

        let depends_on = doc
            .get("dependsOn")
            .map(Value::string_items)
            .unwrap_or_default();

        let success_criteria = doc
            .get("successCriteria")
            .and_then(Value::coerce_string)
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            agent_id,
            name,
            kind,
            priority,
            can_modify_parent_files,
            max_tokens,
            max_cost,
            timeout_minutes,
            result_delivery,
            completion_phrase,
            progress_interval_seconds,
            output_format,
            context_files,
            depends_on,
            success_criteria,
            instructions: doc.body.trim().to_string(),
        })
    }

    /// Render the spec back into its document form. Parsing the output
    /// yields a spec equal to this one.
    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        out.push_str(&format!("agentId: {}\n", quote_if_needed(self.agent_id.as_str())));
        out.push_str(&format!("name: {}\n", quote_if_needed(&self.name)));
        out.push_str(&format!("type: {}\n", self.kind.as_str()));
        out.push_str(&format!("priority: {}\n", self.priority.as_str()));
        out.push_str(&format!(
            "canModifyParentFiles: {}\n",
            self.can_modify_parent_files
        ));
        if let Some(max_tokens) = self.max_tokens {
            out.push_str(&format!("maxTokens: {}\n", max_tokens));
        }
        if let Some(max_cost) = self.max_cost {
            out.push_str(&format!("maxCost: {}\n", max_cost));
        }
        out.push_str(&format!("timeoutMinutes: {}\n", self.timeout_minutes));
        out.push_str(&format!("resultDelivery: {}\n", self.result_delivery.as_str()));
        out.push_str(&format!("completionPhrase: {}\n", self.completion_phrase));
        out.push_str(&format!(
            "progressIntervalSeconds: {}\n",
            self.progress_interval_seconds
        ));
        out.push_str(&format!("outputFormat: {}\n", self.output_format.as_str()));
        if !self.context_files.is_empty() {
            out.push_str("contextFiles:\n");
            for file in &self.context_files {
                out.push_str(&format!("  - {}\n", quote_if_needed(file)));
            }
        }
        if !self.depends_on.is_empty() {
            out.push_str("dependsOn:\n");
            for dep in &self.depends_on {
                out.push_str(&format!("  - {}\n", quote_if_needed(dep)));
            }
        }
        if let Some(criteria) = &self.success_criteria {
            out.push_str(&format!("successCriteria: {}\n", quote_if_needed(criteria)));
        }
        out.push_str("---\n");
        out.push_str(&self.instructions);
        out.push('\n');
        out
    }

    /// Whether periodic progress reporting is enabled.
    pub fn progress_enabled(&self) -> bool {
        self.progress_interval_seconds > 0
    }
}

/// Default completion phrase: `AGENT_<UPPER_ID>_DONE`.
pub fn default_completion_phrase(agent_id: &AgentId) -> String {
    format!("AGENT_{}_DONE", canonical_phrase(agent_id.as_str()))
}

/// Canonicalise a completion phrase: upper-case, with anything outside
/// `[A-Z0-9_-]` mapped to underscore.
pub fn canonical_phrase(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            u @ ('A'..='Z' | '0'..='9' | '_' | '-') => u,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
