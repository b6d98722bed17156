//! Model output parsing.
//!
//! The runtime's reply is untrusted text. It may wrap the JSON in prose or
//! markdown fences, so the first well-formed object anywhere in the text is
//! taken, then validated field by field before anything typed is built.

use super::types::Complexity;
use crate::error::{RuntimeError, RuntimeResult};
use serde_json::{Map, Value};

/// Fields the analyzer needs from the model, validated but not yet resolved
/// against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnalysis {
    pub complexity: Complexity,
    /// Technique identifier as reported. May be a key, a name, or garbage.
    pub technique: String,
    pub justification: Option<String>,
    pub alternatives: Vec<String>,
    pub improvements: Vec<String>,
    pub tips: Vec<String>,
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// First brace-delimited JSON object that parses, scanning left to right.
pub fn extract_first_json_object(text: &str) -> Option<Map<String, Value>> {
    let text = strip_code_fences(text);
    for (pos, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[pos..]).into_iter::<Value>();
        if let Some(Ok(Value::Object(map))) = stream.next() {
            return Some(map);
        }
    }
    None
}

/// Parse and validate a structured analysis reply.
///
/// `complexity` must be a non-empty member of the tier set and `technique`
/// must be a non-empty string; anything else is `MalformedResponse`.
pub fn parse_analysis(text: &str) -> RuntimeResult<RawAnalysis> {
    if text.trim().is_empty() {
        return Err(RuntimeError::EmptyResponse);
    }
    let object = extract_first_json_object(text)
        .ok_or_else(|| RuntimeError::MalformedResponse("no JSON object in response".into()))?;

    let complexity_label = non_empty_str(&object, &["complexity"])
        .ok_or_else(|| RuntimeError::MalformedResponse("missing complexity".into()))?;
    let complexity = Complexity::from_label(complexity_label).ok_or_else(|| {
        RuntimeError::MalformedResponse(format!("unknown complexity {:?}", complexity_label))
    })?;

    let technique = non_empty_str(&object, &["technique", "techniqueKey", "technique_key"])
        .ok_or_else(|| RuntimeError::MalformedResponse("missing technique".into()))?
        .to_string();

    Ok(RawAnalysis {
        complexity,
        technique,
        justification: non_empty_str(&object, &["justification", "rationale", "techniqueDescription"])
            .map(str::to_string),
        alternatives: string_list(&object, &["alternatives", "alternativeTechniques"]),
        improvements: string_list(&object, &["improvements"]),
        tips: string_list(&object, &["tips"]),
    })
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| object.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// String entries of the first array found under `keys`. Non-string items
/// are skipped; objects with a `name` or `key` field contribute that field.
fn string_list(object: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let Some(items) = keys.iter().find_map(|k| object.get(*k).and_then(Value::as_array)) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim()),
            Value::Object(o) => o
                .get("key")
                .or_else(|| o.get("name"))
                .and_then(Value::as_str)
                .map(str::trim),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
