//! Model-listing parser.
//!
//! The HTTP API answers `/api/tags` with `{"models":[{"name":..},..]}`; the
//! CLI prints a whitespace-aligned table:
//!
//! ```text
//! NAME                        ID              SIZE      MODIFIED
//! llama3.2:3b-instruct-fp16   195a8c01d91e    6.4 GB    2 weeks ago
//! ```
//!
//! Either shape is accepted. Order is preserved, duplicates dropped.

use crate::error::{RuntimeError, RuntimeResult};

pub fn parse_model_listing(text: &str) -> RuntimeResult<Vec<String>> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return parse_json_listing(trimmed);
    }

    let mut models: Vec<String> = Vec::new();
    for line in trimmed.lines() {
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        if first.eq_ignore_ascii_case("NAME") {
            continue;
        }
        push_unique(&mut models, first);
    }
    Ok(models)
}

fn parse_json_listing(text: &str) -> RuntimeResult<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let entries = match value.get("models") {
        Some(serde_json::Value::Array(entries)) => entries,
        Some(serde_json::Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            return Err(RuntimeError::MalformedResponse(format!(
                "'models' is not an array: {}",
                other
            )))
        }
    };

    let mut models: Vec<String> = Vec::new();
    for entry in entries {
        let name = entry
            .get("name")
            .or_else(|| entry.get("model"))
            .and_then(|n| n.as_str());
        if let Some(name) = name {
            push_unique(&mut models, name);
        }
    }
    Ok(models)
}

fn push_unique(models: &mut Vec<String>, name: &str) {
    let name = name.trim();
    if !name.is_empty() && !models.iter().any(|m| m == name) {
        models.push(name.to_string());
    }
}
