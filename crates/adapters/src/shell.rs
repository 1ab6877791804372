// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell quoting helpers

/// Escape characters that have special meaning in shell double-quoted strings.
///
/// When a prompt is embedded in a command like `probe "${prompt}"`, characters
/// like backticks and dollar signs would be interpreted by the shell. This
/// function escapes them so they're treated literally.
///
/// Characters escaped:
/// - Backslash `\` → `\\`
/// - Backtick `` ` `` → `` \` ``
/// - Dollar sign `$` → `\$`
/// - Double quote `"` → `\"`
pub fn escape_for_shell_double_quotes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '`' => result.push_str("\\`"),
            '$' => result.push_str("\\$"),
            '"' => result.push_str("\\\""),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
