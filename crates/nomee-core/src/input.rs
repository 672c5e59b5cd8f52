//! Input sanitization boundary.
//!
//! Free-form contribution data arrives from forms and screenshot imports
//! with nulls, numbers, and mixed arrays where strings are expected. All
//! coercion happens here, once, so the analysis code can assume clean
//! `String`/`Vec<String>` input.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Maximum number of parallel trait lists on a contribution.
pub const MAX_TRAIT_GROUPS: usize = 4;

/// Trim text; `None` becomes the empty string.
pub fn sanitize_text(text: Option<&str>) -> String {
    text.map(str::trim).unwrap_or_default().to_string()
}

/// Trim trait labels, drop empty ones, and dedupe case-insensitively.
///
/// The first spelling of a duplicated label wins and order is preserved.
pub fn sanitize_traits<I, S>(traits: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in traits {
        let label = raw.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        if label.is_empty() {
            continue;
        }
        if seen.insert(label.to_lowercase()) {
            out.push(label);
        }
    }
    out
}

/// Coerce an arbitrary JSON value into a string.
///
/// Strings pass through, numbers and booleans are formatted, everything
/// else becomes empty.
pub fn coerce_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Keep only the string entries of a JSON array. Non-arrays yield nothing.
pub fn coerce_strings(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        JsonValue::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Serde helper: lenient string field.
pub fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(coerce_string(&value))
}

/// Serde helper: lenient list of strings.
pub fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(coerce_strings(&value))
}

/// Serde helper: lenient list of trait lists, capped at [`MAX_TRAIT_GROUPS`].
///
/// Loose strings (a flat array, or strings mixed in with nested arrays) are
/// gathered into one group placed where the first of them appeared.
pub fn lenient_trait_groups<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    let JsonValue::Array(items) = value else {
        return Ok(Vec::new());
    };

    let mut groups = Vec::new();
    let mut loose = Vec::new();
    let mut loose_at = None;
    for item in &items {
        if item.is_array() {
            groups.push(coerce_strings(item));
        } else {
            let labels = coerce_strings(item);
            if !labels.is_empty() && loose_at.is_none() {
                loose_at = Some(groups.len());
            }
            loose.extend(labels);
        }
    }
    if let Some(at) = loose_at {
        groups.insert(at, loose);
    }

    groups.truncate(MAX_TRAIT_GROUPS);
    Ok(groups)
}
