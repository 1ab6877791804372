// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn display_roundtrip() {
    let id = SessionId::new("sess-42");
    assert_eq!(id.to_string(), "sess-42");
    assert_eq!(id.as_str(), "sess-42");
}

#[test]
fn serde_roundtrip() {
    let id = SessionId::new("sess-42");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"sess-42\"");
    let back: SessionId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn short_prefix_for_probe_names() {
    let id = SessionId::new("0123456789abcdef");
    assert_eq!(id.short(8), "01234567");
}
