//! Request types shared by every model backend
//!
//! These are independent of any provider implementation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loosely-typed structured result as returned by the backend.
///
/// Nothing about its shape is trusted until it has been normalized and
/// validated against the deployment profile.
pub type RawResult = Map<String, Value>;

/// Sampling settings for a single completion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Temperature for response generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl SamplingOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
        }
    }

    /// Sets the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Named JSON schema describing the shape a structured completion must take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Short identifier passed to backends that require a schema name
    pub name: String,
    /// JSON Schema document
    pub schema: Value,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Names listed under the schema's top-level `required` keyword
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Names listed under the schema's top-level `properties` keyword
    pub fn property_names(&self) -> Vec<&str> {
        self.schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sampling_options_builder() {
        let options = SamplingOptions::with_temperature(0.1).with_max_tokens(2048);
        assert_eq!(options.temperature, 0.1);
        assert_eq!(options.max_tokens, Some(2048));
    }

    #[test]
    fn test_schema_descriptor_fields() {
        let descriptor = SchemaDescriptor::new(
            "thing",
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}, "b": {"type": "integer"}},
                "required": ["a"]
            }),
        );

        assert_eq!(descriptor.required_fields(), vec!["a"]);
        assert_eq!(descriptor.property_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_schema_descriptor_without_keywords() {
        let descriptor = SchemaDescriptor::new("empty", json!({"type": "object"}));
        assert!(descriptor.required_fields().is_empty());
        assert!(descriptor.property_names().is_empty());
    }
}
