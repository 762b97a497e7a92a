//! Locating JSON payloads in model output.

use serde_json::Value;

use super::{AnalysisError, FieldMap};

/// Find the JSON object or array in a model reply.
///
/// Strips a surrounding markdown fence, skips any prose before the first
/// `{` or `[`, and returns the slice up to its balanced close. Returns
/// `None` when there is no opening bracket or it is never closed.
pub fn extract_json(content: &str) -> Option<&str> {
    let mut content = content.trim();
    if let Some(rest) = content.strip_prefix("```json") {
        content = rest.strip_suffix("```").unwrap_or(rest);
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest.strip_suffix("```").unwrap_or(rest);
    }

    let start = content.find(['{', '['])?;
    let bytes = content.as_bytes();
    let (open, close) = if bytes[start] == b'{' {
        (b'{', b'}')
    } else {
        (b'[', b']')
    };

    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(content[start..=i].trim());
            }
        }
    }
    None
}

/// Parse a model reply into a field map. Arrays become objects keyed
/// `item_0`, `item_1`, ...
pub fn parse_fields(content: &str) -> Result<FieldMap, AnalysisError> {
    let payload = extract_json(content).ok_or_else(|| AnalysisError::NoJson(content.to_string()))?;

    match serde_json::from_str::<Value>(payload)? {
        Value::Object(map) => Ok(map),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (format!("item_{}", i), item))
            .collect()),
        other => Err(AnalysisError::NoJson(other.to_string())),
    }
}
