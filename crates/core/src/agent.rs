// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier type for spawned child agents.

use uuid::Uuid;

crate::define_id! {
    /// Unique identifier for a spawned child agent.
    ///
    /// Usually taken from the agent's task spec; generated when the spec
    /// omits one.
    pub struct AgentId;
}

impl AgentId {
    /// Generate a fresh random agent id.
    pub fn generate() -> Self {
        Self::new(format!("agent-{}", &Uuid::new_v4().to_string()[..8]))
    }
}
