use super::normalize::{NormalizationContext, ResultNormalizer};
use super::prompt::{PromptBuilder, PromptLimits};
use super::schema::{profile_schema, SchemaValidator, SchemaViolation};
use super::types::{AnalysisProfile, RawRepositoryData};
use crate::llm::{BackendError, ModelInvoker, SamplingOptions, SchemaDescriptor};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

const DEFAULT_ANALYSIS_TEMPERATURE: f32 = 0.1;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Backend invocation failed during analysis: {0}")]
    Backend(#[from] BackendError),
    #[error("Analysis result violates the profile schema: {0}")]
    SchemaViolation(#[from] SchemaViolation),
}

impl AnalysisError {
    /// A fresh sample from the backend may conform even when this one did not,
    /// so schema violations are reported as retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Backend(e) => e.is_retryable(),
            AnalysisError::SchemaViolation(_) => true,
        }
    }

    /// Field that could not be produced, for schema violations
    pub fn field(&self) -> Option<&str> {
        match self {
            AnalysisError::SchemaViolation(violation) => Some(violation.field()),
            AnalysisError::Backend(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub limits: PromptLimits,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_ANALYSIS_TEMPERATURE,
            max_tokens: None,
            limits: PromptLimits::default(),
        }
    }
}

impl AnalyzerConfig {
    fn sampling(&self) -> SamplingOptions {
        let options = SamplingOptions::with_temperature(self.temperature);
        match self.max_tokens {
            Some(max_tokens) => options.with_max_tokens(max_tokens),
            None => options,
        }
    }
}

/// Stage 1: turns raw repository signals into a validated deployment profile.
///
/// Holds no per-call state; one analyzer can serve concurrent requests.
pub struct RepositoryAnalyzer {
    invoker: Arc<dyn ModelInvoker>,
    config: AnalyzerConfig,
    shape: SchemaDescriptor,
    instruction: String,
}

impl RepositoryAnalyzer {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self::with_config(invoker, AnalyzerConfig::default())
    }

    pub fn with_config(invoker: Arc<dyn ModelInvoker>, config: AnalyzerConfig) -> Self {
        let shape = profile_schema();
        let instruction = PromptBuilder::analysis_instruction(&shape);
        Self {
            invoker,
            config,
            shape,
            instruction,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub async fn analyze(&self, repo: &RawRepositoryData) -> Result<AnalysisProfile, AnalysisError> {
        let start_time = Instant::now();
        let name = repo.full_name();

        info!(
            repository = %name,
            files = repo.files.len(),
            backend = self.invoker.name(),
            "Starting repository analysis"
        );

        let prompt = PromptBuilder::analysis_prompt(repo, self.config.limits);
        debug!("Built analysis prompt with {} characters", prompt.len());

        let raw = self
            .invoker
            .generate_structured(&self.instruction, &prompt, &self.shape, self.config.sampling())
            .await
            .map_err(|e| {
                error!(repository = %name, "Analysis backend call failed: {}", e);
                AnalysisError::Backend(e)
            })?;

        let unknown = SchemaValidator::unknown_fields(&raw);
        if !unknown.is_empty() {
            debug!(fields = ?unknown, "Dropping non-canonical fields from analysis result");
        }

        let normalizer = ResultNormalizer::new(NormalizationContext {
            manifest_names: repo.manifest_names(),
            fallback_language: repo.detected_language.clone(),
        });
        let normalized = normalizer.normalize(raw);

        let profile = SchemaValidator::validate(&normalized).map_err(|violation| {
            warn!(repository = %name, "Analysis result rejected: {}", violation);
            AnalysisError::SchemaViolation(violation)
        })?;

        info!(
            repository = %name,
            language = %profile.language,
            framework = profile.framework.as_deref().unwrap_or("none"),
            package_manager = %profile.package_manager,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        Ok(profile)
    }

    /// Like [`analyze`](Self::analyze), abandoning the backend call once
    /// `deadline` has elapsed.
    pub async fn analyze_with_deadline(
        &self,
        repo: &RawRepositoryData,
        deadline: Duration,
    ) -> Result<AnalysisProfile, AnalysisError> {
        match tokio::time::timeout(deadline, self.analyze(repo)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    repository = %repo.full_name(),
                    "Analysis abandoned after {:?}", deadline
                );
                Err(AnalysisError::Backend(BackendError::TimeoutError {
                    seconds: deadline.as_secs(),
                }))
            }
        }
    }
}

impl std::fmt::Debug for RepositoryAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryAnalyzer")
            .field("backend", &self.invoker.name())
            .field("config", &self.config)
            .finish()
    }
}
