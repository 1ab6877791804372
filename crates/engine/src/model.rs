// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model selection for plan tasks.
//!
//! Deterministic mapping from per-task hints to a model identifier. No
//! I/O; the same task always selects the same model under the same
//! config.

use herd_core::plan::AgentKind;
use herd_core::schedule::{LIGHTWEIGHT_TOKEN_CEILING, SESSION_TOKEN_THRESHOLD};
use herd_core::{GroupTask, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named model tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Balanced,
    Deep,
}

impl ModelTier {
    /// Parse a tier name; unknown names are not a tier.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "balanced" => Some(Self::Balanced),
            "deep" => Some(Self::Deep),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Deep => "deep",
        }
    }
}

/// Tier-to-model mapping plus per-task overrides.
#[derive(Debug, Clone)]
pub struct ModelSelectorConfig {
    pub fast: String,
    pub balanced: String,
    pub deep: String,
    /// Explicit task id -> model id overrides; they win over everything.
    pub overrides: HashMap<TaskId, String>,
}

impl Default for ModelSelectorConfig {
    fn default() -> Self {
        Self {
            fast: "haiku".to_string(),
            balanced: "sonnet".to_string(),
            deep: "opus".to_string(),
            overrides: HashMap::new(),
        }
    }
}

impl ModelSelectorConfig {
    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Balanced => &self.balanced,
            ModelTier::Deep => &self.deep,
        }
    }
}

/// A selection with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelChoice {
    pub model: String,
    pub reason: String,
    /// The author's tier hint, when one was honoured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer_recommendation: Option<String>,
}

/// Stateless model selector.
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    config: ModelSelectorConfig,
}

impl ModelSelector {
    pub fn new(config: ModelSelectorConfig) -> Self {
        Self { config }
    }

    /// Pick a model for a task, first matching rule wins:
    /// explicit override, author tier hint, token estimate, agent kind.
    pub fn select(&self, task: &GroupTask) -> ModelChoice {
        if let Some(model) = self.config.overrides.get(task.id()) {
            return ModelChoice {
                model: model.clone(),
                reason: format!("explicit override for task {}", task.id()),
                optimizer_recommendation: None,
            };
        }

        if let Some(hint) = task.item.recommended_model.as_deref() {
            if let Some(tier) = ModelTier::parse(hint) {
                return ModelChoice {
                    model: self.config.model_for(tier).to_string(),
                    reason: format!("recommended tier {}", tier.as_str()),
                    optimizer_recommendation: Some(hint.to_string()),
                };
            }
        }

        let estimate = task.item.estimated_tokens.unwrap_or(0);
        if estimate > SESSION_TOKEN_THRESHOLD {
            return ModelChoice {
                model: self.config.deep.clone(),
                reason: format!("estimate {} tokens needs the deep tier", estimate),
                optimizer_recommendation: None,
            };
        }

        if matches!(
            task.resolved_agent_type,
            AgentKind::Implement | AgentKind::Review
        ) {
            return ModelChoice {
                model: self.config.deep.clone(),
                reason: format!("{} work uses the deep tier", task.resolved_agent_type.as_str()),
                optimizer_recommendation: None,
            };
        }

        if task.resolved_agent_type == AgentKind::Test || estimate > LIGHTWEIGHT_TOKEN_CEILING {
            return ModelChoice {
                model: self.config.balanced.clone(),
                reason: "medium-weight work uses the balanced tier".to_string(),
                optimizer_recommendation: None,
            };
        }

        ModelChoice {
            model: self.config.fast.clone(),
            reason: "small explore/general work uses the fast tier".to_string(),
            optimizer_recommendation: None,
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
