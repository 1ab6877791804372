// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn extracts_phrase() {
    let stream = "working...\n<promise>AGENT_X_DONE</promise>\ntrailing";
    assert_eq!(
        extract_completion_phrase(stream),
        Some("AGENT_X_DONE".to_string())
    );
}

/// Extracted phrases are always equal to their upper-case form.
#[test]
fn extraction_uppercases() {
    let stream = "<promise>agent_x_done</promise>";
    assert_eq!(
        extract_completion_phrase(stream),
        Some("AGENT_X_DONE".to_string())
    );
}

#[test]
fn first_occurrence_wins() {
    let stream = "<promise>FIRST</promise> noise <promise>SECOND</promise>";
    assert_eq!(extract_completion_phrase(stream), Some("FIRST".to_string()));
}

#[test]
fn no_signal_no_phrase() {
    assert_eq!(extract_completion_phrase("plain output"), None);
    assert_eq!(extract_completion_phrase("<promise></promise>"), None);
    assert_eq!(extract_completion_phrase("<promise>bad space</promise>"), None);
}

#[test]
fn contains_completion_matches_canonically() {
    let stream = "<promise>task_done</promise>";
    assert!(contains_completion(stream, "TASK_DONE"));
    assert!(contains_completion(stream, "task_done"));
    assert!(!contains_completion(stream, "OTHER"));
}

#[test]
fn earlier_foreign_signal_masks_later_match() {
    let stream = "<promise>OTHER</promise> <promise>MINE</promise>";
    assert!(!contains_completion(stream, "MINE"));
}

#[test]
fn signal_rendering() {
    assert_eq!(completion_signal("ABC_1"), "<promise>ABC_1</promise>");
}
