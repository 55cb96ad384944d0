//! Tolerant extraction of JSON objects from model text
//!
//! Even when a JSON response format is requested, some providers wrap the
//! object in a markdown fence or surround it with prose.

use super::error::BackendError;
use super::types::RawResult;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

const RAW_EXCERPT_CHARS: usize = 200;

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").expect("valid regex"))
}

/// Locates the JSON object text inside a model response.
pub fn extract_json_from_response(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    if trimmed.contains("```") {
        if let Some(inner) = fenced_block_re()
            .captures(trimmed)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().trim())
        {
            if inner.starts_with('{') && inner.ends_with('}') {
                return Some(inner);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}

/// Parses a model response into a raw, unvalidated JSON object.
pub fn parse_raw_result(response: &str) -> Result<RawResult, BackendError> {
    let excerpt = || Some(response.chars().take(RAW_EXCERPT_CHARS).collect::<String>());

    let json = extract_json_from_response(response).ok_or_else(|| BackendError::InvalidResponse {
        message: "No JSON object found in response".to_string(),
        raw_response: excerpt(),
    })?;

    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BackendError::InvalidResponse {
            message: format!("Expected a JSON object, got {}", json_kind(&other)),
            raw_response: excerpt(),
        }),
        Err(e) => {
            warn!("JSON parse error: {}", e);
            Err(BackendError::InvalidResponse {
                message: format!("Invalid JSON: {}", e),
                raw_response: excerpt(),
            })
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
