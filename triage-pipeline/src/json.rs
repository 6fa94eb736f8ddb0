//! Recovering a JSON object from raw model output.
//!
//! Models asked for "only JSON" still wrap it in code fences or prose now and
//! then. [`extract_json_object`] peels a surrounding fence, tries a strict
//! parse, and otherwise takes the leftmost balanced `{...}` span that parses
//! as an object. A stray brace in prose (`The set {x, y`) or a quoted one
//! (`Use "{" carefully`) only costs a retry from the next `{`.
//!
//! The balance scan tracks string literals, so braces inside strings
//! (`{"a": "b}c"}`) and escaped quotes do not shift the depth count.

use serde_json::{Map, Value};

/// Extract a JSON object from `raw`.
///
/// Returns `None` when no object can be recovered. Arrays and scalars are not
/// accepted as results.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let cleaned = strip_code_fences(raw);

    if let Some(object) = parse_object(cleaned) {
        return Some(object);
    }

    object_starts(cleaned)
        .filter_map(|start| balanced_object_at(cleaned, start))
        .find_map(parse_object)
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Trim and remove a leading ```` ```lang ```` line and a trailing ```` ``` ````.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();

    if let Some(rest) = s.strip_prefix("```") {
        let tag_len = rest.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(rest.len());
        s = rest[tag_len..].trim_start();
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }
    s
}

/// Locate the leftmost balanced `{...}` span.
///
/// A `{` that never closes is skipped and the scan resumes at the next one.
pub fn balanced_object_span(s: &str) -> Option<&str> {
    object_starts(s).find_map(|start| balanced_object_at(s, start))
}

fn object_starts(s: &str) -> impl Iterator<Item = usize> + '_ {
    s.bytes().enumerate().filter(|&(_, b)| b == b'{').map(|(i, _)| i)
}

/// Balanced span opening at byte `start`, which must hold a `{`.
///
/// Every structural character is ASCII, so byte offsets are always valid
/// char boundaries.
fn balanced_object_at(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in s.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
