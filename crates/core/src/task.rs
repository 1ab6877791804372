// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier type for plan items.

crate::define_id! {
    /// Unique identifier for a plan task.
    ///
    /// Assigned by the plan author; referenced by dependency lists and
    /// model-selection overrides.
    pub struct TaskId;
}
