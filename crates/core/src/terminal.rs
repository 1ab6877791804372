// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded terminal scrollback buffer.
//!
//! Each supervised session owns one buffer holding the most recent bytes of
//! its terminal output. Appends beyond the soft cap trim the buffer back to
//! the trim target, keeping the newest bytes. Readers that cover the trimmed
//! region see a fixed truncation marker so downstream consumers (probe
//! prompts, log excerpts) know the head of the stream is missing.

/// Soft cap on buffer size. Exceeding this after an append triggers a trim.
pub const MAX_BUFFER_BYTES: usize = 2 * 1024 * 1024;

/// Size the buffer is trimmed back to when the cap is exceeded.
pub const TRIM_TARGET_BYTES: usize = 1024 * 1024 + 512 * 1024;

/// Marker prepended to reads that cover a trimmed region.
pub const TRUNCATION_MARKER: &str = "[Earlier output truncated]\n\n";

/// Chunk size for writing large payloads into external processes.
///
/// Writers pushing big payloads (context refresh directives, injected
/// prompts) must go through [`TerminalBuffer::chunked`] to avoid
/// back-pressure hangs in the receiving pty.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Bounded append-only byte store over a session's scrollback.
#[derive(Debug, Default)]
pub struct TerminalBuffer {
    data: Vec<u8>,
    truncated: bool,
}

impl TerminalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes, trimming to the newest [`TRIM_TARGET_BYTES`] when the
    /// total exceeds [`MAX_BUFFER_BYTES`].
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        if self.data.len() > MAX_BUFFER_BYTES {
            let keep_from = self.data.len() - TRIM_TARGET_BYTES;
            self.data.drain(..keep_from);
            self.truncated = true;
        }
    }

    /// Current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a trim has ever discarded bytes from this buffer.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// The last `n` bytes of the buffer.
    ///
    /// When the buffer has been trimmed and `n` covers everything that is
    /// left (the caller effectively asked for the full stream), the result
    /// is prefixed with [`TRUNCATION_MARKER`]. Partial tails carry no
    /// marker: their head is cut off by the caller's own choice of `n`,
    /// not by trimming.
    pub fn tail(&self, n: usize) -> Vec<u8> {
        let start = self.data.len().saturating_sub(n);
        let slice = &self.data[start..];
        if self.truncated && start == 0 {
            let mut out = Vec::with_capacity(TRUNCATION_MARKER.len() + slice.len());
            out.extend_from_slice(TRUNCATION_MARKER.as_bytes());
            out.extend_from_slice(slice);
            out
        } else {
            slice.to_vec()
        }
    }

    /// The whole buffer, marker-prefixed if trimmed.
    pub fn full(&self) -> Vec<u8> {
        self.tail(self.data.len())
    }

    /// Split `data` into consecutive chunks of at most [`CHUNK_SIZE`] bytes.
    ///
    /// Required writing primitive for any caller pushing large payloads
    /// into an external process.
    pub fn chunked(data: &[u8]) -> impl Iterator<Item = &[u8]> {
        data.chunks(CHUNK_SIZE)
    }
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
