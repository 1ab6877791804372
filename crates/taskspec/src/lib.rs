// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-taskspec: documents of the spawn protocol.
//!
//! Parsing and serialisation for the frontmatter-framed documents parents
//! and child agents exchange on disk: the spawn task spec, the progress
//! file, the result file, the loop directive, and the completion-phrase
//! signal scanned from terminal output.

pub mod frontmatter;
pub mod loop_meta;
pub mod progress;
pub mod promise;
pub mod result;
pub mod spec;

pub use frontmatter::{Document, FrontmatterError, Value};
pub use loop_meta::LoopMeta;
pub use progress::{AgentProgress, Subtask};
pub use promise::{completion_signal, contains_completion, extract_completion_phrase};
pub use result::{AgentResult, FileAction, FileChange, ResultParseError, ResultStatus};
pub use spec::{
    canonical_phrase, default_completion_phrase, OutputFormat, Priority, ResultDelivery,
    SpawnSpec, SpecError,
};
