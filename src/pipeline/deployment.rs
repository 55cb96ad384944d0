use crate::analysis::{AnalysisError, AnalysisProfile, RawRepositoryData, RepositoryAnalyzer};
use crate::config::DockgenConfig;
use crate::generation::{ArtifactGenerator, BuildArtifact, GenerationError};
use crate::llm::{BackendError, ModelInvoker};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Analysis stage failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Generation stage failed: {0}")]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Analysis(_) => "analysis",
            PipelineError::Generation(_) => "generation",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Analysis(e) => e.is_retryable(),
            PipelineError::Generation(e) => e.is_retryable(),
        }
    }
}

/// Result of running both stages on one repository
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub profile: AnalysisProfile,
    pub artifact: BuildArtifact,
}

/// Runs analysis followed by generation.
pub struct DeploymentPipeline {
    analyzer: RepositoryAnalyzer,
    generator: ArtifactGenerator,
}

impl DeploymentPipeline {
    pub fn new(analyzer: RepositoryAnalyzer, generator: ArtifactGenerator) -> Self {
        Self {
            analyzer,
            generator,
        }
    }

    /// Both stages share `invoker` and take their settings from `config`
    pub fn with_invoker(invoker: Arc<dyn ModelInvoker>, config: &DockgenConfig) -> Self {
        Self::new(
            RepositoryAnalyzer::with_config(invoker.clone(), config.analyzer_config()),
            ArtifactGenerator::with_config(invoker, config.generator_config()),
        )
    }

    pub fn from_config(config: &DockgenConfig) -> Self {
        Self::with_invoker(config.create_invoker(), config)
    }

    pub fn analyzer(&self) -> &RepositoryAnalyzer {
        &self.analyzer
    }

    pub fn generator(&self) -> &ArtifactGenerator {
        &self.generator
    }

    pub async fn run(&self, repo: &RawRepositoryData) -> Result<PipelineOutput, PipelineError> {
        let start = Instant::now();
        let name = repo.full_name();
        info!(repository = %name, "Starting deployment pipeline");

        let profile = self.analyzer.analyze(repo).await.map_err(|e| {
            error!(repository = %name, stage = "analysis", "Pipeline failed: {}", e);
            PipelineError::Analysis(e)
        })?;

        let artifact = self.generator.generate(&profile).await.map_err(|e| {
            error!(repository = %name, stage = "generation", "Pipeline failed: {}", e);
            PipelineError::Generation(e)
        })?;

        info!(
            repository = %name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Deployment pipeline completed"
        );

        Ok(PipelineOutput { profile, artifact })
    }

    /// Runs both stages within a single overall `deadline`. Generation gets
    /// whatever time analysis left over.
    pub async fn run_with_deadline(
        &self,
        repo: &RawRepositoryData,
        deadline: Duration,
    ) -> Result<PipelineOutput, PipelineError> {
        let start = Instant::now();

        let profile = self.analyzer.analyze_with_deadline(repo, deadline).await?;

        let remaining = deadline.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return Err(PipelineError::Generation(GenerationError::Backend(
                BackendError::TimeoutError {
                    seconds: deadline.as_secs(),
                },
            )));
        }

        let artifact = self
            .generator
            .generate_with_deadline(&profile, remaining)
            .await?;

        Ok(PipelineOutput { profile, artifact })
    }
}

impl std::fmt::Debug for DeploymentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentPipeline")
            .field("analyzer", &self.analyzer)
            .field("generator", &self.generator)
            .finish()
    }
}
