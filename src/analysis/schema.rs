//! Canonical profile shape and its validator

use super::types::AnalysisProfile;
use crate::llm::{RawResult, SchemaDescriptor};
use serde_json::Value;
use thiserror::Error;

/// Every field the canonical profile may carry
pub const CANONICAL_FIELDS: [&str; 10] = [
    "language",
    "framework",
    "runtime_version",
    "package_manager",
    "dependencies",
    "exposed_port",
    "environment_variables",
    "health_check_path",
    "build_command",
    "start_command",
];

/// Fields without which no profile can be produced
pub const REQUIRED_FIELDS: [&str; 3] = ["language", "package_manager", "start_command"];

pub const PROFILE_SCHEMA_NAME: &str = "AnalysisProfile";

/// A structured result that could not be narrowed into a profile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("missing required field: {field}")]
    MissingField { field: String },
    #[error("required field is empty: {field}")]
    EmptyField { field: String },
    #[error("field {field} has the wrong type, expected {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },
    #[error("exposed_port {port} is outside 1-65535")]
    PortOutOfRange { port: i64 },
}

impl SchemaViolation {
    pub fn field(&self) -> &str {
        match self {
            SchemaViolation::MissingField { field }
            | SchemaViolation::EmptyField { field }
            | SchemaViolation::InvalidType { field, .. } => field,
            SchemaViolation::PortOutOfRange { .. } => "exposed_port",
        }
    }
}

/// JSON schema handed to the backend for stage 1
pub fn profile_schema() -> SchemaDescriptor {
    let schema = schemars::schema_for!(AnalysisProfile);
    let value = serde_json::to_value(schema).unwrap_or(Value::Null);
    SchemaDescriptor::new(PROFILE_SCHEMA_NAME, value)
}

pub struct SchemaValidator;

impl SchemaValidator {
    /// Fields present in `raw` that the canonical shape does not know
    pub fn unknown_fields(raw: &RawResult) -> Vec<String> {
        raw.keys()
            .filter(|key| !CANONICAL_FIELDS.contains(&key.as_str()))
            .cloned()
            .collect()
    }

    /// Checks every field's presence and type, then builds the typed profile.
    ///
    /// Unknown fields are ignored here; callers decide whether to prune or
    /// flag them via [`SchemaValidator::unknown_fields`].
    pub fn validate(raw: &RawResult) -> Result<AnalysisProfile, SchemaViolation> {
        for field in REQUIRED_FIELDS {
            match raw.get(field) {
                None | Some(Value::Null) => {
                    return Err(SchemaViolation::MissingField {
                        field: field.to_string(),
                    })
                }
                Some(Value::String(s)) if s.trim().is_empty() => {
                    return Err(SchemaViolation::EmptyField {
                        field: field.to_string(),
                    })
                }
                Some(Value::String(_)) => {}
                Some(_) => return Err(invalid(field, "string")),
            }
        }

        for field in ["framework", "runtime_version", "build_command", "health_check_path"] {
            match raw.get(field) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => return Err(invalid(field, "string or null")),
            }
        }

        if let Some(deps) = present(raw, "dependencies") {
            let map = deps
                .as_object()
                .ok_or_else(|| invalid("dependencies", "object of strings"))?;
            if map.values().any(|v| !v.is_string()) {
                return Err(invalid("dependencies", "object of strings"));
            }
        }

        if let Some(vars) = present(raw, "environment_variables") {
            let list = vars
                .as_array()
                .ok_or_else(|| invalid("environment_variables", "array of strings"))?;
            if list.iter().any(|v| !v.is_string()) {
                return Err(invalid("environment_variables", "array of strings"));
            }
        }

        if let Some(port) = present(raw, "exposed_port") {
            let port = port
                .as_i64()
                .ok_or_else(|| invalid("exposed_port", "integer"))?;
            if !(1..=65535).contains(&port) {
                return Err(SchemaViolation::PortOutOfRange { port });
            }
        }

        let canonical: RawResult = raw
            .iter()
            .filter(|(key, value)| CANONICAL_FIELDS.contains(&key.as_str()) && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        serde_json::from_value(Value::Object(canonical))
            .map_err(|_| invalid("profile", "canonical profile shape"))
    }
}

fn present<'a>(raw: &'a RawResult, field: &str) -> Option<&'a Value> {
    raw.get(field).filter(|v| !v.is_null())
}

fn invalid(field: &str, expected: &'static str) -> SchemaViolation {
    SchemaViolation::InvalidType {
        field: field.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawResult {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    fn minimal() -> Value {
        json!({
            "language": "Python",
            "package_manager": "pip",
            "start_command": "uvicorn main:app --host 0.0.0.0 --port 8000"
        })
    }

    #[test]
    fn test_profile_schema_descriptor() {
        let descriptor = profile_schema();
        assert_eq!(descriptor.name, PROFILE_SCHEMA_NAME);

        let mut required = descriptor.required_fields();
        required.sort_unstable();
        assert_eq!(required, vec!["language", "package_manager", "start_command"]);

        let mut properties = descriptor.property_names();
        properties.sort_unstable();
        let mut canonical = CANONICAL_FIELDS.to_vec();
        canonical.sort_unstable();
        assert_eq!(properties, canonical);
    }

    #[test]
    fn test_validate_minimal_profile() {
        let profile = SchemaValidator::validate(&raw(minimal())).unwrap();
        assert_eq!(profile.language, "Python");
        assert_eq!(profile.health_check_path, "/");
        assert!(profile.exposed_port.is_none());
    }

    #[test]
    fn test_validate_full_profile() {
        let profile = SchemaValidator::validate(&raw(json!({
            "language": "JavaScript",
            "framework": "Express",
            "runtime_version": "nodejs-20",
            "package_manager": "npm",
            "dependencies": {"express": "^4.18.0"},
            "exposed_port": 3000,
            "environment_variables": ["PORT", "DB_URI"],
            "health_check_path": "/health",
            "build_command": null,
            "start_command": "node server.js"
        })))
        .unwrap();

        assert_eq!(profile.framework.as_deref(), Some("Express"));
        assert_eq!(profile.exposed_port, Some(3000));
        assert_eq!(profile.dependencies["express"], "^4.18.0");
        assert_eq!(profile.environment_variables, vec!["PORT", "DB_URI"]);
        assert!(profile.build_command.is_none());
    }

    #[test]
    fn test_missing_required_field() {
        let mut input = raw(minimal());
        input.remove("start_command");
        assert_eq!(
            SchemaValidator::validate(&input),
            Err(SchemaViolation::MissingField {
                field: "start_command".to_string()
            })
        );

        input.insert("start_command".to_string(), Value::Null);
        assert!(matches!(
            SchemaValidator::validate(&input),
            Err(SchemaViolation::MissingField { .. })
        ));
    }

    #[test]
    fn test_empty_required_field() {
        let mut input = raw(minimal());
        input.insert("language".to_string(), json!("   "));
        let err = SchemaValidator::validate(&input).unwrap_err();
        assert_eq!(err.field(), "language");
        assert!(matches!(err, SchemaViolation::EmptyField { .. }));
    }

    #[test]
    fn test_nested_values_rejected() {
        let mut input = raw(minimal());
        input.insert(
            "dependencies".to_string(),
            json!({"production": {"fastapi": "0.110"}}),
        );
        assert!(matches!(
            SchemaValidator::validate(&input),
            Err(SchemaViolation::InvalidType { .. })
        ));

        let mut input = raw(minimal());
        input.insert("framework".to_string(), json!({"name": "FastAPI"}));
        assert_eq!(
            SchemaValidator::validate(&input).unwrap_err().field(),
            "framework"
        );
    }

    #[test]
    fn test_port_checks() {
        let mut input = raw(minimal());
        input.insert("exposed_port".to_string(), json!("8000"));
        assert!(matches!(
            SchemaValidator::validate(&input),
            Err(SchemaViolation::InvalidType { .. })
        ));

        input.insert("exposed_port".to_string(), json!(70000));
        assert_eq!(
            SchemaValidator::validate(&input),
            Err(SchemaViolation::PortOutOfRange { port: 70000 })
        );
    }

    #[test]
    fn test_unknown_fields() {
        let mut input = raw(minimal());
        input.insert("confidence".to_string(), json!(0.9));
        input.insert("runtime".to_string(), json!({"version": "3.11"}));

        let mut unknown = SchemaValidator::unknown_fields(&input);
        unknown.sort();
        assert_eq!(unknown, vec!["confidence", "runtime"]);

        // Unknown fields never reach the typed profile
        assert!(SchemaValidator::validate(&input).is_ok());
    }
}
