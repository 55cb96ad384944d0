//! Configuration management for dockgen
//!
//! Settings are loaded once from environment variables with sensible defaults
//! and then handed to each component as an immutable value. Nothing reads the
//! environment after construction.
//!
//! # Environment Variables
//!
//! ## Dockgen Configuration
//! - `DOCKGEN_PROVIDER`: Provider selection (ollama|openai|claude|gemini|grok|groq) - default: "gemini"
//! - `DOCKGEN_MODEL`: Model name - default: "gemini-2.5-flash"
//! - `DOCKGEN_ANALYSIS_TEMPERATURE`: Stage-1 sampling temperature - default: "0.1"
//! - `DOCKGEN_GENERATION_TEMPERATURE`: Stage-2 sampling temperature - default: "0.2"
//! - `DOCKGEN_REQUEST_TIMEOUT`: Backend timeout in seconds - default: "60"
//! - `DOCKGEN_MAX_TOKENS`: Completion token cap - default: unset
//! - `DOCKGEN_LOG_LEVEL`: Logging level - default: "info"
//! - `DOCKGEN_ENFORCE_HARDENING`: Reject Dockerfiles without USER/EXPOSE/HEALTHCHECK - default: "false"
//! - `DOCKGEN_API_BASE_URL`: Custom backend endpoint - default: unset
//!
//! ## GenAI Provider Configuration
//! These environment variables are read directly by the genai library:
//! - **Ollama**: `OLLAMA_HOST` (default: http://localhost:11434)
//! - **OpenAI**: `OPENAI_API_KEY`
//! - **Claude**: `ANTHROPIC_API_KEY`
//! - **Gemini**: `GEMINI_API_KEY`
//! - **Grok**: `XAI_API_KEY`
//! - **Groq**: `GROQ_API_KEY`
//!
//! # Example
//!
//! ```no_run
//! use dockgen::{ArtifactGenerator, DockgenConfig, RepositoryAnalyzer};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DockgenConfig::from_env()?;
//! config.validate()?;
//!
//! let invoker = config.create_invoker();
//! let analyzer = RepositoryAnalyzer::with_config(invoker.clone(), config.analyzer_config());
//! let generator = ArtifactGenerator::with_config(invoker, config.generator_config());
//! # Ok(())
//! # }
//! ```

use crate::analysis::AnalyzerConfig;
use crate::generation::GeneratorConfig;
use crate::llm::{GenAIInvoker, ModelInvoker, Provider};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PROVIDER: Provider = Provider::Gemini;
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_ANALYSIS_TEMPERATURE: f32 = 0.1;
const DEFAULT_GENERATION_TEMPERATURE: f32 = 0.2;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, claude, gemini, grok, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Process-wide settings shared read-only by both stages
#[derive(Debug, Clone, PartialEq)]
pub struct DockgenConfig {
    pub provider: Provider,
    /// Model name, without provider prefix
    pub model: String,
    pub analysis_temperature: f32,
    pub generation_temperature: f32,
    pub request_timeout_secs: u64,
    pub max_tokens: Option<u32>,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    pub enforce_hardening: bool,
    pub api_base_url: Option<String>,
}

impl Default for DockgenConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER,
            model: DEFAULT_MODEL.to_string(),
            analysis_temperature: DEFAULT_ANALYSIS_TEMPERATURE,
            generation_temperature: DEFAULT_GENERATION_TEMPERATURE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_tokens: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            enforce_hardening: false,
            api_base_url: None,
        }
    }
}

/// Reads and parses `key`, `None` when unset or blank
fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn string_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl DockgenConfig {
    /// Loads configuration from `DOCKGEN_*` variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but cannot be parsed.
    /// Range checks are left to [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let provider = match string_var("DOCKGEN_PROVIDER") {
            Some(name) => Provider::parse(&name).ok_or(ConfigError::InvalidProvider(name))?,
            None => defaults.provider,
        };

        Ok(Self {
            provider,
            model: string_var("DOCKGEN_MODEL").unwrap_or(defaults.model),
            analysis_temperature: parse_var("DOCKGEN_ANALYSIS_TEMPERATURE")?
                .unwrap_or(defaults.analysis_temperature),
            generation_temperature: parse_var("DOCKGEN_GENERATION_TEMPERATURE")?
                .unwrap_or(defaults.generation_temperature),
            request_timeout_secs: parse_var("DOCKGEN_REQUEST_TIMEOUT")?
                .unwrap_or(defaults.request_timeout_secs),
            max_tokens: parse_var("DOCKGEN_MAX_TOKENS")?,
            log_level: string_var("DOCKGEN_LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
            enforce_hardening: parse_var("DOCKGEN_ENFORCE_HARDENING")?
                .unwrap_or(defaults.enforce_hardening),
            api_base_url: string_var("DOCKGEN_API_BASE_URL"),
        })
    }

    /// Validates the configuration
    ///
    /// Checks that:
    /// - Temperatures lie in `[0.0, 2.0]`
    /// - The request timeout is between 1 second and 10 minutes
    /// - The token cap, when set, is non-zero
    /// - Log level is valid
    ///
    /// Provider credentials are checked by genai on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("Analysis temperature", self.analysis_temperature),
            ("Generation temperature", self.generation_temperature),
        ] {
            if !(0.0..=MAX_TEMPERATURE).contains(&value) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be between 0.0 and {}, got {}",
                    name, MAX_TEMPERATURE, value
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.max_tokens == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "Max tokens must be greater than zero".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            temperature: self.analysis_temperature,
            max_tokens: self.max_tokens,
            ..Default::default()
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            temperature: self.generation_temperature,
            max_tokens: self.max_tokens,
            enforce_hardening: self.enforce_hardening,
            ..Default::default()
        }
    }

    /// Builds the genai-backed invoker for the configured provider and model.
    ///
    /// The returned handle is shared by both stages.
    pub fn create_invoker(&self) -> Arc<dyn ModelInvoker> {
        Arc::new(GenAIInvoker::new(
            self.provider,
            self.model.clone(),
            self.request_timeout(),
            self.api_base_url.clone(),
        ))
    }
}

impl fmt::Display for DockgenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dockgen Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Analysis Temperature: {}", self.analysis_temperature)?;
        writeln!(f, "  Generation Temperature: {}", self.generation_temperature)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        if let Some(max_tokens) = self.max_tokens {
            writeln!(f, "  Max Tokens: {}", max_tokens)?;
        }
        writeln!(f, "  Enforce Hardening: {}", self.enforce_hardening)?;
        if let Some(ref url) = self.api_base_url {
            writeln!(f, "  API Base URL: {}", url)?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "DOCKGEN_PROVIDER",
        "DOCKGEN_MODEL",
        "DOCKGEN_ANALYSIS_TEMPERATURE",
        "DOCKGEN_GENERATION_TEMPERATURE",
        "DOCKGEN_REQUEST_TIMEOUT",
        "DOCKGEN_MAX_TOKENS",
        "DOCKGEN_LOG_LEVEL",
        "DOCKGEN_ENFORCE_HARDENING",
        "DOCKGEN_API_BASE_URL",
    ];

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clear_all() -> Vec<EnvGuard> {
        VARS.iter().map(|key| EnvGuard::unset(key)).collect()
    }

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        let _guards = clear_all();

        let config = DockgenConfig::from_env().unwrap();

        assert_eq!(config, DockgenConfig::default());
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.analysis_temperature, 0.1);
        assert_eq!(config.generation_temperature, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _cleared = clear_all();
        let _guards = vec![
            EnvGuard::set("DOCKGEN_PROVIDER", "Claude"),
            EnvGuard::set("DOCKGEN_MODEL", "claude-sonnet-4"),
            EnvGuard::set("DOCKGEN_ANALYSIS_TEMPERATURE", "0.0"),
            EnvGuard::set("DOCKGEN_GENERATION_TEMPERATURE", "0.7"),
            EnvGuard::set("DOCKGEN_REQUEST_TIMEOUT", "120"),
            EnvGuard::set("DOCKGEN_MAX_TOKENS", "8192"),
            EnvGuard::set("DOCKGEN_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("DOCKGEN_ENFORCE_HARDENING", "true"),
            EnvGuard::set("DOCKGEN_API_BASE_URL", "http://localhost:8080/v1/"),
        ];

        let config = DockgenConfig::from_env().unwrap();

        assert_eq!(config.provider, Provider::Claude);
        assert_eq!(config.model, "claude-sonnet-4");
        assert_eq!(config.analysis_temperature, 0.0);
        assert_eq!(config.generation_temperature, 0.7);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.max_tokens, Some(8192));
        assert_eq!(config.log_level, "debug");
        assert!(config.enforce_hardening);
        assert_eq!(
            config.api_base_url.as_deref(),
            Some("http://localhost:8080/v1/")
        );
    }

    #[test]
    #[serial]
    fn test_invalid_provider() {
        let _cleared = clear_all();
        let _guard = EnvGuard::set("DOCKGEN_PROVIDER", "watsonx");

        let err = DockgenConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProvider(ref name) if name == "watsonx"));
    }

    #[test]
    #[serial]
    fn test_unparseable_value() {
        let _cleared = clear_all();
        let _guard = EnvGuard::set("DOCKGEN_REQUEST_TIMEOUT", "soon");

        let err = DockgenConfig::from_env().unwrap_err();
        assert!(
            matches!(err, ConfigError::ParseError { ref field, .. } if field == "DOCKGEN_REQUEST_TIMEOUT")
        );
    }

    #[test]
    fn test_validation_rejects_out_of_range_temperature() {
        let config = DockgenConfig {
            generation_temperature: 2.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DockgenConfig {
            analysis_temperature: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_timeout() {
        let mut config = DockgenConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.request_timeout_secs = 601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let config = DockgenConfig {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_component_configs() {
        let config = DockgenConfig {
            analysis_temperature: 0.05,
            generation_temperature: 0.4,
            max_tokens: Some(4096),
            enforce_hardening: true,
            ..Default::default()
        };

        let analyzer = config.analyzer_config();
        assert_eq!(analyzer.temperature, 0.05);
        assert_eq!(analyzer.max_tokens, Some(4096));

        let generator = config.generator_config();
        assert_eq!(generator.temperature, 0.4);
        assert_eq!(generator.max_tokens, Some(4096));
        assert!(generator.enforce_hardening);
        assert_eq!(generator.min_length, 300);
    }

    #[test]
    fn test_create_invoker() {
        let invoker = DockgenConfig::default().create_invoker();
        assert!(!invoker.name().is_empty());
    }

    #[test]
    fn test_config_display() {
        let display = DockgenConfig::default().to_string();
        assert!(display.contains("Dockgen Configuration:"));
        assert!(display.contains("Provider: gemini"));
        assert!(!display.contains("Max Tokens"));
    }
}
