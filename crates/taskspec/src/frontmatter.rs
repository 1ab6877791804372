// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontmatter-framed document parsing.
//!
//! Documents look like:
//!
//! ```text
//! ---
//! name: fix-tests
//! priority: high
//! # limits are advisory
//! maxTokens: 20000
//! contextFiles:
//!   - src/lib.rs
//!   - "src/odd name.rs"
//! ---
//! Free-form body.
//! ```
//!
//! The grammar is deliberately small and line-oriented: top and bottom
//! delimiters are lines containing exactly `---`; between them each
//! non-blank, non-comment line is `key: value`, or `key:` opening a block
//! array (`  - item` lines) or a one-level nested mapping (`  sub: value`
//! lines). Scalars are barewords, quoted strings, integers, floats,
//! booleans, and `null`/`~`. Inline arrays are `[a, b, c]`; inline
//! mappings are `{k: v, k2: v2}` (one level, also usable as block array
//! items).

use std::fmt;
use thiserror::Error;

/// Errors from parsing a frontmatter document.
#[derive(Debug, Error, PartialEq)]
pub enum FrontmatterError {
    #[error("document has no frontmatter block")]
    MissingFrontmatter,
    #[error("frontmatter opened on line {opened_at} is never closed")]
    Unclosed { opened_at: usize },
    #[error("malformed frontmatter line {line}: {text}")]
    MalformedLine { line: usize, text: String },
}

/// A parsed frontmatter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// One level of nesting only.
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Render any scalar as a string (barewords, numbers, booleans).
    /// Arrays and maps return `None`.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Null => None,
            Value::Array(_) | Value::Map(_) => None,
        }
    }

    /// String items of an array value, coercing scalar items.
    pub fn string_items(&self) -> Vec<String> {
        match self {
            Value::Array(items) => items.iter().filter_map(|v| v.coerce_string()).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A parsed document: ordered frontmatter entries plus the raw body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    entries: Vec<(String, Value)>,
    pub body: String,
}

impl Document {
    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// All top-level entries in document order.
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    /// Parse a frontmatter-framed document.
    pub fn parse(text: &str) -> Result<Self, FrontmatterError> {
        let lines: Vec<&str> = text.lines().collect();
        let mut idx = 0;

        // Skip leading blank lines before the opening fence
        while idx < lines.len() && lines[idx].trim().is_empty() {
            idx += 1;
        }
        if idx >= lines.len() || lines[idx].trim_end() != "---" {
            return Err(FrontmatterError::MissingFrontmatter);
        }
        let opened_at = idx + 1;
        idx += 1;

        let mut entries: Vec<(String, Value)> = Vec::new();
        let mut closed = false;

        while idx < lines.len() {
            let raw = lines[idx];
            let line_no = idx + 1;
            if raw.trim_end() == "---" {
                closed = true;
                idx += 1;
                break;
            }
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                idx += 1;
                continue;
            }
            if raw.starts_with(' ') || raw.starts_with('\t') {
                // Indented line outside a block context
                return Err(FrontmatterError::MalformedLine {
                    line: line_no,
                    text: raw.to_string(),
                });
            }

            let Some((key, rest)) = raw.split_once(':') else {
                return Err(FrontmatterError::MalformedLine {
                    line: line_no,
                    text: raw.to_string(),
                });
            };
            let key = key.trim().to_string();
            let rest = rest.trim();

            if !rest.is_empty() {
                entries.push((key, parse_scalar(rest)));
                idx += 1;
                continue;
            }

            // Bare `key:` opens a block array or nested mapping
            idx += 1;
            let mut items: Vec<Value> = Vec::new();
            let mut map_entries: Vec<(String, Value)> = Vec::new();
            while idx < lines.len() {
                let sub = lines[idx];
                if sub.trim_end() == "---" || !sub.starts_with("  ") {
                    break;
                }
                let sub_trimmed = sub.trim();
                if sub_trimmed.is_empty() || sub_trimmed.starts_with('#') {
                    idx += 1;
                    continue;
                }
                if let Some(item) = sub_trimmed.strip_prefix("- ") {
                    items.push(parse_scalar(item.trim()));
                } else if let Some((sub_key, sub_value)) = sub_trimmed.split_once(':') {
                    map_entries.push((sub_key.trim().to_string(), parse_scalar(sub_value.trim())));
                } else {
                    return Err(FrontmatterError::MalformedLine {
                        line: idx + 1,
                        text: sub.to_string(),
                    });
                }
                idx += 1;
            }
            let value = if !items.is_empty() {
                Value::Array(items)
            } else if !map_entries.is_empty() {
                Value::Map(map_entries)
            } else {
                Value::Null
            };
            entries.push((key, value));
        }

        if !closed {
            return Err(FrontmatterError::Unclosed { opened_at });
        }

        let body = lines[idx..].join("\n");
        Ok(Self { entries, body })
    }
}

/// Parse a scalar or inline-array value.
fn parse_scalar(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let items = split_inline_items(inner)
            .into_iter()
            .map(|item| parse_scalar(&item))
            .collect();
        return Value::Array(items);
    }
    if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        let entries = split_inline_items(inner)
            .into_iter()
            .filter_map(|entry| {
                let (key, value) = entry.split_once(':')?;
                Some((key.trim().to_string(), parse_scalar(value.trim())))
            })
            .collect();
        return Value::Map(entries);
    }
    if (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
        || (text.starts_with('\'') && text.ends_with('\'') && text.len() >= 2)
    {
        return Value::String(text[1..text.len() - 1].to_string());
    }
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "~" => return Value::Null,
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(f) = text.parse::<f64>() {
        return Value::Float(f);
    }
    Value::String(text.to_string())
}

/// Split inline array items on commas, respecting quotes.
fn split_inline_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                ',' => {
                    items.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    let last = current.trim();
    if !last.is_empty() {
        items.push(last.to_string());
    }
    items
}

/// Quote a string for frontmatter output when it would not survive as a
/// bareword.
pub fn quote_if_needed(s: &str) -> String {
    let needs_quoting = s.is_empty()
        || s.contains(':')
        || s.contains('#')
        || s.contains('[')
        || s.contains(',')
        || s.starts_with(['\'', '"', '-', ' '])
        || s.ends_with(' ')
        || matches!(s, "true" | "false" | "null" | "~")
        || s.parse::<f64>().is_ok();
    if needs_quoting {
        format!("\"{}\"", s.replace('"', "'"))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
