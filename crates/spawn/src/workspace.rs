// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child workspace and comms directory layout.
//!
//! ```text
//! <parent>/spawns/<agent-id>/
//!   INSTRUCTIONS.md
//!   <copied context files>
//!   comms/
//!     progress.json
//!     result.md
//!     messages/
//!       001-parent.md
//!       002-agent.md
//! ```

use herd_core::AgentId;
use herd_taskspec::SpawnSpec;
use std::path::{Path, PathBuf};

/// File the child is directed to read first.
pub const INSTRUCTIONS_FILE: &str = "INSTRUCTIONS.md";

/// Who wrote a message file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAuthor {
    Parent,
    Agent,
}

/// One numbered message in the comms directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildMessage {
    pub seq: u32,
    pub author: MessageAuthor,
    pub path: PathBuf,
}

/// Paths of one child agent's workspace.
#[derive(Debug, Clone)]
pub struct SpawnWorkspace {
    pub agent_id: AgentId,
    pub root: PathBuf,
}

impl SpawnWorkspace {
    pub fn comms_dir(&self) -> PathBuf {
        self.root.join("comms")
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.comms_dir().join("messages")
    }

    pub fn progress_path(&self) -> PathBuf {
        self.comms_dir().join("progress.json")
    }

    pub fn result_path(&self) -> PathBuf {
        self.comms_dir().join("result.md")
    }

    pub fn instructions_path(&self) -> PathBuf {
        self.root.join(INSTRUCTIONS_FILE)
    }

    /// The workspace paths for an agent, without touching the filesystem.
    pub fn at(parent_dir: &Path, agent_id: &AgentId) -> Self {
        Self {
            agent_id: agent_id.clone(),
            root: parent_dir.join("spawns").join(agent_id.as_str()),
        }
    }

    /// Create the workspace directory tree.
    pub async fn create(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.messages_dir()).await
    }

    /// Create the workspace directories under `<parent>/spawns/<agent-id>/`.
    pub async fn materialize(parent_dir: &Path, agent_id: &AgentId) -> std::io::Result<Self> {
        let workspace = Self::at(parent_dir, agent_id);
        workspace.create().await?;
        Ok(workspace)
    }

    /// Copy the spec's context files from the parent directory into the
    /// workspace. Missing files are skipped with a warning — the child is
    /// told what it got via the instruction manifest.
    pub async fn copy_context_files(
        &self,
        spec: &SpawnSpec,
        parent_dir: &Path,
    ) -> std::io::Result<Vec<String>> {
        let mut copied = Vec::new();
        for name in &spec.context_files {
            let source = parent_dir.join(name);
            if !source.exists() {
                tracing::warn!(
                    agent_id = %self.agent_id,
                    file = name.as_str(),
                    "context file missing, skipping"
                );
                continue;
            }
            let file_name = source
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| name.clone());
            tokio::fs::copy(&source, self.root.join(&file_name)).await?;
            copied.push(file_name);
        }
        Ok(copied)
    }

    /// All messages currently in the comms directory, ordered by sequence
    /// number.
    pub async fn scan_messages(&self) -> Vec<ChildMessage> {
        let mut messages = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(self.messages_dir()).await else {
            return messages;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(message) = parse_message_name(&name, entry.path()) {
                messages.push(message);
            }
        }
        messages.sort_by_key(|m| m.seq);
        messages
    }

    /// Write the next parent message (`NNN-parent.md`) and return it.
    pub async fn post_parent_message(&self, content: &str) -> std::io::Result<ChildMessage> {
        let next_seq = self
            .scan_messages()
            .await
            .last()
            .map(|m| m.seq + 1)
            .unwrap_or(1);
        let path = self
            .messages_dir()
            .join(format!("{:03}-parent.md", next_seq));
        tokio::fs::write(&path, content).await?;
        Ok(ChildMessage {
            seq: next_seq,
            author: MessageAuthor::Parent,
            path,
        })
    }
}

/// Parse `NNN-parent.md` / `NNN-agent.md` names; anything else is not a
/// message.
fn parse_message_name(name: &str, path: PathBuf) -> Option<ChildMessage> {
    let stem = name.strip_suffix(".md")?;
    let (seq, author) = stem.split_once('-')?;
    let seq: u32 = seq.parse().ok()?;
    let author = match author {
        "parent" => MessageAuthor::Parent,
        "agent" => MessageAuthor::Agent,
        _ => return None,
    };
    Some(ChildMessage { seq, author, path })
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
