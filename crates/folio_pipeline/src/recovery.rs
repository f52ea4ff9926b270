//! Best-effort decoding of untrusted model output.
//!
//! Model responses that should be JSON often arrive wrapped in markdown
//! fences, surrounded by prose, or truncated mid-document. This module
//! recovers as much structure as possible without ever failing: the caller
//! receives whatever list of values survived and decides whether an empty
//! result is fatal.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Recover the array stored under `key` in a model response.
///
/// Tiers, in order:
/// 1. Parse the text as-is.
/// 2. Strip markdown code fences and parse.
/// 3. Slice from the first `{` to the last `}` and parse.
/// 4. Scan for individual object candidates, auto-closing unbalanced
///    braces, parsing each independently and discarding failures.
///
/// A bare top-level array is accepted in place of `{key: [...]}`. Never
/// errors; an unrecoverable response yields an empty vector.
///
/// # Examples
///
/// ```
/// use folio_pipeline::recover_array;
///
/// let fenced = "```json\n{\"spreads\": [{\"spreadIndex\": 0}]}\n```";
/// let items = recover_array(fenced, "spreads");
/// assert_eq!(items.len(), 1);
/// ```
pub fn recover_array(text: &str, key: &str) -> Vec<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if let Some(items) = take_array(value, key) {
            return items;
        }
    }

    if let Some(stripped) = strip_code_fences(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
            if let Some(items) = take_array(value, key) {
                debug!(key, "Recovered JSON from fenced block");
                return items;
            }
        }
    }

    if let Some(sliced) = slice_outer_braces(text) {
        if let Ok(value) = serde_json::from_str::<Value>(sliced) {
            if let Some(items) = take_array(value, key) {
                debug!(key, "Recovered JSON from brace-bounded substring");
                return items;
            }
        }
    }

    let salvaged = salvage_objects(text, key);
    debug!(
        key,
        count = salvaged.len(),
        response_length = text.len(),
        "Per-object salvage pass"
    );
    salvaged
}

/// Pull the `key` array out of a parsed value, accepting a bare array.
fn take_array(value: Value, key: &str) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Extract the contents of a markdown code fence, preferring ```json.
fn strip_code_fences(text: &str) -> Option<String> {
    for pattern in ["```json", "```"] {
        if let Some(start) = text.find(pattern) {
            let content_start = start + pattern.len();
            // Skip a language specifier on the bare-fence path.
            let content_start = if pattern == "```" {
                text[content_start..]
                    .find('\n')
                    .map(|n| content_start + n + 1)
                    .unwrap_or(content_start)
            } else {
                content_start
            };
            return match text[content_start..].find("```") {
                Some(end) => Some(text[content_start..content_start + end].trim().to_string()),
                // No closing fence, likely truncated. Take the rest.
                None => Some(text[content_start..].trim().to_string()),
            };
        }
    }
    None
}

/// Slice from the first `{` to the last `}`.
fn slice_outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Length of the balanced object starting at the first byte of `text`,
/// which must be `{`. `None` when the text ends before the object closes.
fn balanced_object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Append the close braces a truncated candidate is missing.
///
/// Only braces are repaired; a candidate cut off inside a string or a
/// value stays invalid and is discarded by the caller.
fn auto_close_braces(text: &str) -> String {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in text.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    let mut repaired = text.to_string();
    repaired.extend(std::iter::repeat('}').take(depth));
    repaired
}

/// Tier 4: scan for object candidates and keep the ones that parse.
fn salvage_objects(text: &str, key: &str) -> Vec<Value> {
    // An object candidate starts with a brace followed by a quoted key.
    let candidate_start =
        Regex::new(r#"\{\s*""#).unwrap_or_else(|e| unreachable!("static regex: {e}"));

    let mut out = Vec::new();
    let mut cursor = 0;

    while let Some(found) = candidate_start.find(&text[cursor..]) {
        let start = cursor + found.start();
        match balanced_object_len(&text[start..]) {
            Some(len) => match serde_json::from_str::<Value>(&text[start..start + len]) {
                Ok(value) => {
                    push_salvaged(&mut out, value, key);
                    cursor = start + len;
                }
                Err(_) => cursor = start + 1,
            },
            None => {
                // Candidate runs off the end of the text.
                match serde_json::from_str::<Value>(&auto_close_braces(&text[start..])) {
                    Ok(value) => {
                        push_salvaged(&mut out, value, key);
                        break;
                    }
                    Err(_) => cursor = start + 1,
                }
            }
        }
        if cursor >= text.len() {
            break;
        }
    }
    out
}

/// Flatten a salvaged document wrapper into its elements.
fn push_salvaged(out: &mut Vec<Value>, value: Value, key: &str) {
    match value {
        Value::Object(mut map) if map.contains_key(key) => match map.remove(key) {
            Some(Value::Array(items)) => out.extend(items),
            Some(other) => out.push(other),
            None => {}
        },
        other => out.push(other),
    }
}
