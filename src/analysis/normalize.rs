//! Deterministic repair of structurally non-conforming analysis results
//!
//! Models regularly return the right information in the wrong shape: the
//! language nested under a runtime object, dependencies split into groups,
//! ports as strings. [`ResultNormalizer::normalize`] is the single place that
//! rewrites those shapes into the canonical field set. It never fails; anything
//! it cannot repair is left for [`SchemaValidator`](super::schema::SchemaValidator)
//! to reject.
//!
//! Rules run in a fixed order and each is idempotent, so normalizing an already
//! normalized result is a no-op.

use super::schema::CANONICAL_FIELDS;
use super::types::LanguageFamily;
use crate::llm::RawResult;
use serde_json::{Map, Value};
use tracing::debug;

/// Dependency grouping keys, merged in this order. Later groups overwrite
/// earlier ones on key collision.
const DEPENDENCY_GROUPS: [&str; 5] = [
    "production",
    "production_dependencies",
    "development",
    "dev_dependencies",
    "development_dependencies",
];

const DEFAULT_HEALTH_CHECK_PATH: &str = "/";

/// Repository facts the normalizer may draw on when the model omitted a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationContext {
    /// Filenames of the supplied package-manager manifests and lockfiles
    pub manifest_names: Vec<String>,
    /// Language detected upstream, used when the model omits one
    pub fallback_language: Option<String>,
}

impl NormalizationContext {
    fn has_manifest(&self, name: &str) -> bool {
        self.manifest_names
            .iter()
            .any(|m| m == name || m.ends_with(&format!("/{}", name)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultNormalizer {
    context: NormalizationContext,
}

impl ResultNormalizer {
    pub fn new(context: NormalizationContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &NormalizationContext {
        &self.context
    }

    pub fn normalize(&self, raw: RawResult) -> RawResult {
        let mut result = raw;

        lift_runtime(&mut result);
        self.apply_language_fallback(&mut result);
        self.infer_package_manager(&mut result);
        coerce_port(&mut result);
        flatten_dependencies(&mut result);
        coerce_environment_variables(&mut result);
        lift_health_check(&mut result);
        prune(&mut result);

        result
    }

    fn apply_language_fallback(&self, result: &mut RawResult) {
        if !is_missing(result, "language") {
            return;
        }
        if let Some(language) = self.context.fallback_language.as_deref() {
            if !language.trim().is_empty() {
                debug!(language, "Using detected language as fallback");
                result.insert("language".to_string(), Value::String(language.to_string()));
            }
        }
    }

    fn infer_package_manager(&self, result: &mut RawResult) {
        if !is_missing(result, "package_manager") {
            return;
        }

        // Some models tuck the package manager inside the dependency map
        let misplaced = result
            .get("dependencies")
            .and_then(misplaced_package_manager)
            .map(str::to_string);

        let package_manager = misplaced.unwrap_or_else(|| {
            let language = result
                .get("language")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let family = LanguageFamily::from_language(language);
            infer_from_manifests(family, &self.context).to_string()
        });

        debug!(package_manager = %package_manager, "Filled in missing package manager");
        result.insert(
            "package_manager".to_string(),
            Value::String(package_manager),
        );
    }
}

/// Package manager implied by the language family and the lockfiles present
pub fn infer_from_manifests(family: LanguageFamily, context: &NormalizationContext) -> &'static str {
    match family {
        LanguageFamily::JavaScript => {
            if context.has_manifest("yarn.lock") {
                "yarn"
            } else if context.has_manifest("pnpm-lock.yaml") {
                "pnpm"
            } else {
                "npm"
            }
        }
        LanguageFamily::Python => {
            if context.has_manifest("pyproject.toml") {
                "uv"
            } else if context.has_manifest("Pipfile") {
                "pipenv"
            } else {
                "pip"
            }
        }
        LanguageFamily::Go => "go mod",
        LanguageFamily::Java => "maven",
        LanguageFamily::Other => "unknown",
    }
}

/// Absent, null, or a blank string
fn is_missing(result: &RawResult, field: &str) -> bool {
    match result.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn lift_runtime(result: &mut RawResult) {
    if !is_missing(result, "language") {
        return;
    }
    let Some(Value::Object(runtime)) = result.get("runtime").cloned() else {
        return;
    };

    if let Some(language) = runtime.get("language").filter(|v| !v.is_null()) {
        result.insert("language".to_string(), language.clone());
    }
    if is_missing(result, "runtime_version") {
        if let Some(version) = runtime.get("version").filter(|v| !v.is_null()) {
            let version = match version {
                Value::Number(n) => Value::String(n.to_string()),
                other => other.clone(),
            };
            result.insert("runtime_version".to_string(), version);
        }
    }
}

fn coerce_port(result: &mut RawResult) {
    if is_missing(result, "exposed_port") {
        if let Some(port) = result.get("port").filter(|v| !v.is_null()).cloned() {
            result.insert("exposed_port".to_string(), port);
        }
    }

    let Some(port) = result.get("exposed_port") else {
        return;
    };

    let coerced = match port {
        Value::Null => return,
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
    .filter(|p| (1..=65535).contains(p));

    let value = coerced.map_or(Value::Null, Value::from);
    result.insert("exposed_port".to_string(), value);
}

fn flatten_dependencies(result: &mut RawResult) {
    let Some(Value::Object(deps)) = result.get("dependencies") else {
        return;
    };

    let grouped = DEPENDENCY_GROUPS
        .iter()
        .any(|group| deps.get(*group).map_or(false, Value::is_object));

    let mut flat = Map::new();
    if grouped {
        for group in DEPENDENCY_GROUPS {
            if let Some(Value::Object(entries)) = deps.get(group) {
                for (name, version) in entries {
                    if name == "package_manager" {
                        continue;
                    }
                    if let Some(version) = version_string(version) {
                        flat.insert(name.clone(), Value::String(version));
                    }
                }
            }
        }
    } else {
        for (name, version) in deps {
            if name == "package_manager" {
                continue;
            }
            if let Some(version) = version_string(version) {
                flat.insert(name.clone(), Value::String(version));
            }
        }
    }

    result.insert("dependencies".to_string(), Value::Object(flat));
}

/// A package manager string placed among the dependencies, either at the top
/// of the map or inside one of the dependency groups
fn misplaced_package_manager<'a>(deps: &'a Value) -> Option<&'a str> {
    let non_blank = |v: &'a Value| -> Option<&'a str> { v.as_str().filter(|pm| !pm.trim().is_empty()) };

    deps.get("package_manager").and_then(non_blank).or_else(|| {
        DEPENDENCY_GROUPS.iter().find_map(|group| {
            deps.get(*group)
                .and_then(|entries| entries.get("package_manager"))
                .and_then(non_blank)
        })
    })
}

fn version_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_environment_variables(result: &mut RawResult) {
    let names: Vec<Value> = match result.get("environment_variables") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .map(Value::String)
            .collect(),
        Some(Value::Object(obj)) => {
            let mut keys: Vec<String> = obj.keys().cloned().collect();
            keys.sort();
            keys.into_iter().map(Value::String).collect()
        }
        _ => return,
    };

    result.insert("environment_variables".to_string(), Value::Array(names));
}

fn lift_health_check(result: &mut RawResult) {
    if !is_missing(result, "health_check_path") {
        return;
    }

    let path = match result.get("health_check") {
        Some(Value::Object(obj)) => obj
            .get("endpoint")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or(DEFAULT_HEALTH_CHECK_PATH)
            .to_string(),
        Some(Value::String(s)) if s.trim().starts_with('/') => s.trim().to_string(),
        _ => DEFAULT_HEALTH_CHECK_PATH.to_string(),
    };

    result.insert("health_check_path".to_string(), Value::String(path));
}

fn prune(result: &mut RawResult) {
    result.retain(|key, _| CANONICAL_FIELDS.contains(&key.as_str()));
}
