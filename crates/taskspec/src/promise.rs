// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion-signal scanning.
//!
//! A child signals termination by emitting the exact literal
//! `<promise>PHRASE</promise>` on its own output stream. The phrase is a
//! run of ASCII letters, digits, underscores, and hyphens, canonicalised
//! to upper case. The first occurrence in the stream wins.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static PROMISE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<promise>([A-Za-z0-9_-]+)</promise>").expect("constant regex pattern is valid")
});

/// Render the completion signal a child must emit for `phrase`.
pub fn completion_signal(phrase: &str) -> String {
    format!("<promise>{}</promise>", phrase)
}

/// Extract the first completion phrase from a terminal stream, upper-cased.
pub fn extract_completion_phrase(stream: &str) -> Option<String> {
    PROMISE_PATTERN
        .captures(stream)
        .map(|caps| caps[1].to_ascii_uppercase())
}

/// Whether the stream contains the completion signal for a specific phrase.
///
/// The expected phrase is compared canonically (upper-cased); the first
/// occurrence in the stream decides — a stray later signal for a different
/// phrase never masks an earlier match.
pub fn contains_completion(stream: &str, phrase: &str) -> bool {
    extract_completion_phrase(stream)
        .is_some_and(|found| found == phrase.to_ascii_uppercase())
}

#[cfg(test)]
#[path = "promise_tests.rs"]
mod tests;
