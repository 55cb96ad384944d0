use super::cleanup::strip_formatting;
use super::directives::{default_start_directive, Directive, DirectiveReport};
use crate::analysis::{AnalysisProfile, PromptBuilder};
use crate::llm::{BackendError, ModelInvoker, SamplingOptions};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

const DEFAULT_GENERATION_TEMPERATURE: f32 = 0.2;
const DEFAULT_MIN_LENGTH: usize = 300;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DEPENDENCY_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Backend invocation failed during generation: {0}")]
    Backend(#[from] BackendError),
    #[error("Generated Dockerfile too short ({length} chars, minimum {minimum})")]
    TooShort { length: usize, minimum: usize },
    #[error("Generated Dockerfile missing FROM instruction")]
    MissingBaseImage,
    #[error("Generated Dockerfile missing {directive} directive")]
    MissingDirective { directive: Directive },
}

impl GenerationError {
    /// Every failure here stems from one sampled completion; another sample
    /// may pass, except when the backend itself refuses the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Backend(e) => e.is_retryable(),
            _ => true,
        }
    }

    /// Directive whose absence caused the failure
    pub fn directive(&self) -> Option<Directive> {
        match self {
            GenerationError::MissingBaseImage => Some(Directive::BaseImage),
            GenerationError::MissingDirective { directive } => Some(*directive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Shortest accepted artifact, in characters
    pub min_length: usize,
    /// Port used when the profile declares none
    pub default_port: u16,
    /// Dependencies listed in the prompt
    pub dependency_limit: usize,
    /// Fail when USER, EXPOSE or HEALTHCHECK is absent
    pub enforce_hardening: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_GENERATION_TEMPERATURE,
            max_tokens: None,
            min_length: DEFAULT_MIN_LENGTH,
            default_port: DEFAULT_PORT,
            dependency_limit: DEFAULT_DEPENDENCY_LIMIT,
            enforce_hardening: false,
        }
    }
}

impl GeneratorConfig {
    fn sampling(&self) -> SamplingOptions {
        let options = SamplingOptions::with_temperature(self.temperature);
        match self.max_tokens {
            Some(max_tokens) => options.with_max_tokens(max_tokens),
            None => options,
        }
    }
}

/// A Dockerfile that passed the load-bearing checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
    pub content: String,
    /// Directive presence after repair
    pub report: DirectiveReport,
    /// A default start directive was appended
    pub repaired: bool,
}

impl BuildArtifact {
    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

impl fmt::Display for BuildArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Stage 2: turns a deployment profile into Dockerfile text.
pub struct ArtifactGenerator {
    invoker: Arc<dyn ModelInvoker>,
    config: GeneratorConfig,
}

impl ArtifactGenerator {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self::with_config(invoker, GeneratorConfig::default())
    }

    pub fn with_config(invoker: Arc<dyn ModelInvoker>, config: GeneratorConfig) -> Self {
        Self { invoker, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub async fn generate(&self, profile: &AnalysisProfile) -> Result<BuildArtifact, GenerationError> {
        let start_time = Instant::now();
        let label = profile.framework_label();

        info!(
            framework = %label,
            backend = self.invoker.name(),
            "Generating Dockerfile"
        );

        let prompt = PromptBuilder::generation_prompt(
            profile,
            self.config.default_port,
            self.config.dependency_limit,
        );

        let raw = self
            .invoker
            .generate_text(
                PromptBuilder::generation_instruction(),
                &prompt,
                self.config.sampling(),
            )
            .await
            .map_err(|e| {
                error!(framework = %label, "Generation backend call failed: {}", e);
                GenerationError::Backend(e)
            })?;

        let mut content = strip_formatting(&raw);
        debug!(
            raw_length = raw.len(),
            cleaned_length = content.len(),
            "Stripped formatting from generated text"
        );

        let length = content.chars().count();
        if length < self.config.min_length {
            warn!(length, minimum = self.config.min_length, "Generated Dockerfile too short");
            return Err(GenerationError::TooShort {
                length,
                minimum: self.config.min_length,
            });
        }

        let mut report = DirectiveReport::inspect(&content);
        if !report.has_base_image {
            warn!(framework = %label, "Generated Dockerfile missing FROM instruction");
            return Err(GenerationError::MissingBaseImage);
        }

        let repaired = !report.has_start;
        if repaired {
            let directive = default_start_directive(profile, self.config.default_port);
            warn!(%directive, "Dockerfile missing CMD/ENTRYPOINT, adding default");
            // A dangling continuation would swallow the appended line
            content = content.trim_end().trim_end_matches('\\').trim_end().to_string();
            content.push('\n');
            content.push_str(&directive);
            report = DirectiveReport::inspect(&content);

            if !report.has_start {
                warn!(framework = %label, "Default start directive not recognised after repair");
                return Err(GenerationError::MissingDirective {
                    directive: Directive::StartCommand,
                });
            }
        }

        info!(
            framework = %label,
            length = content.chars().count(),
            has_user = report.has_user,
            has_healthcheck = report.has_healthcheck,
            has_expose = report.has_expose,
            has_start = report.has_start,
            repaired,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Dockerfile generated"
        );

        if self.config.enforce_hardening {
            if let Some(directive) = report.missing_hardening().into_iter().next() {
                warn!(%directive, "Rejecting Dockerfile without hardening directive");
                return Err(GenerationError::MissingDirective { directive });
            }
        }

        Ok(BuildArtifact {
            content,
            report,
            repaired,
        })
    }

    /// Like [`generate`](Self::generate), abandoning the backend call once
    /// `deadline` has elapsed.
    pub async fn generate_with_deadline(
        &self,
        profile: &AnalysisProfile,
        deadline: Duration,
    ) -> Result<BuildArtifact, GenerationError> {
        match tokio::time::timeout(deadline, self.generate(profile)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Generation abandoned after {:?}", deadline);
                Err(GenerationError::Backend(BackendError::TimeoutError {
                    seconds: deadline.as_secs(),
                }))
            }
        }
    }
}

impl fmt::Debug for ArtifactGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactGenerator")
            .field("backend", &self.invoker.name())
            .field("config", &self.config)
            .finish()
    }
}
