//! Lenient extraction of structured data from model output.
//!
//! Model replies are free text that usually, but not always, contain a JSON
//! object, sometimes wrapped in a markdown code fence and sometimes with
//! commentary around it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static QUOTED_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"(category|priority|title|description)"\s*:\s*"([^"]+)""#).unwrap()
});

/// Remove a surrounding markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// The first balanced `{ ... }` span, ignoring braces inside JSON strings.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse model output into a JSON object: first the whole (unfenced) text,
/// then the first embedded object.
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let cleaned = strip_code_fences(text);
    let parsed = serde_json::from_str::<Value>(cleaned).ok().or_else(|| {
        first_json_object(cleaned).and_then(|obj| serde_json::from_str::<Value>(obj).ok())
    })?;
    match parsed {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Recover `"field": "value"` pairs from text that is not valid JSON.
///
/// Only the report fields are recognised; the first occurrence of each wins.
pub fn extract_quoted_fields(text: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    for caps in QUOTED_FIELD.captures_iter(text) {
        let name = caps[1].to_ascii_lowercase();
        fields
            .entry(name)
            .or_insert_with(|| Value::String(caps[2].to_string()));
    }
    fields
}

/// A string field, treating missing, non-string and blank values alike.
pub fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
