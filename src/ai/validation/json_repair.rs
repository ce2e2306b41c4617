//! JSON Repair
//!
//! Stage outputs are supposed to be JSON but nothing enforces it. The repairer
//! recovers the common damage a chat model does to JSON:
//! - wrapping it in a Markdown code fence
//! - surrounding it with prose
//! - trailing commas before `]` or `}`
//! - output cut off before the closing brackets

use serde_json::Value;
use tracing::debug;

use crate::types::{RapportError, Result};

/// Parse JSON from a model reply, repairing it when needed
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    JsonRepairer::new()
        .parse_or_repair(content)
        .map(|(value, _)| value)
}

/// Lenient JSON recovery for model output
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Parse, returning whether a repair was applied
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool)> {
        self.try_parse(raw).ok_or_else(|| {
            RapportError::Validation(format!(
                "Unparseable JSON: {}...",
                raw.chars().take(120).collect::<String>()
            ))
        })
    }

    /// Same as [`parse_or_repair`](Self::parse_or_repair) without an error value
    pub fn try_parse(&self, raw: &str) -> Option<(Value, bool)> {
        let cleaned = strip_fences(raw.trim().trim_start_matches('\u{feff}'));

        if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
            return Some((value, false));
        }

        let candidate = embedded_json(cleaned).unwrap_or(cleaned);
        let repaired = close_open_brackets(&drop_trailing_commas(candidate));

        match serde_json::from_str::<Value>(&repaired) {
            Ok(value) => {
                debug!("JSON repaired ({} -> {} chars)", raw.len(), repaired.len());
                Some((value, true))
            }
            Err(e) => {
                debug!("JSON repair failed: {}", e);
                None
            }
        }
    }
}

// =============================================================================
// Repair steps
// =============================================================================

fn strip_fences(s: &str) -> &str {
    let mut body = s;
    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(newline) => &body[newline + 1..],
            None => "",
        };
    }
    body.trim_end().trim_end_matches("```").trim()
}

/// Slice from the first `{` or `[` to its matching closer (or the end)
fn embedded_json(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let tail = &s[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in tail.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&tail[..idx + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Some(tail)
}

fn drop_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in s.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(ch);
            continue;
        }

        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = s[idx + 1..].trim_start().chars().next();
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        out.push(ch);
    }

    out
}

/// Append the closers a truncated document is missing, innermost first
fn close_open_brackets(s: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = s.trim_end().trim_end_matches(',').to_string();
    if in_string {
        out.push('"');
    }
    out.extend(stack.into_iter().rev());
    out
}
