//! dockgen - AI-assisted Dockerfile generation from repository metadata
//!
//! This library infers a project's deployment requirements from raw repository
//! signals and produces a production-hardened Dockerfile, using a Large
//! Language Model for both steps while enforcing a strict contract around its
//! output.
//!
//! # Core Concepts
//!
//! - **Model Invoker**: Pluggable backend capability ([`ModelInvoker`]) with a
//!   schema-constrained and a free-text operation. [`GenAIInvoker`] talks to
//!   real providers; [`MockInvoker`] replays canned responses in tests.
//! - **Analysis**: [`RepositoryAnalyzer`] turns [`RawRepositoryData`] into a
//!   validated [`AnalysisProfile`], repairing non-conforming model output on
//!   the way.
//! - **Generation**: [`ArtifactGenerator`] turns a profile into Dockerfile text,
//!   rejecting unusable output and appending a start directive when missing.
//!
//! # Example Usage
//!
//! ```no_run
//! use dockgen::{DeploymentPipeline, DockgenConfig, RawRepositoryData};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DockgenConfig::from_env()?;
//! config.validate()?;
//!
//! let repo = RawRepositoryData::new("acme", "shop")
//!     .with_files(["package.json", "server.js"])
//!     .with_package_file("package.json", r#"{"scripts": {"start": "node server.js"}}"#);
//!
//! let output = DeploymentPipeline::from_config(&config).run(&repo).await?;
//! println!("{}", output.artifact);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod generation;
pub mod llm;
pub mod pipeline;
pub mod util;

pub use analysis::{
    AnalysisError, AnalysisProfile, AnalyzerConfig, FileDescriptor, LanguageFamily,
    RawRepositoryData, RepositoryAnalyzer, ResultNormalizer, SchemaValidator, SchemaViolation,
};
pub use config::{ConfigError, DockgenConfig};
pub use generation::{
    ArtifactGenerator, BuildArtifact, Directive, DirectiveReport, GenerationError, GeneratorConfig,
};
pub use llm::{
    BackendError, GenAIInvoker, MockInvoker, MockResponse, ModelInvoker, Provider, RawResult,
    SamplingOptions, SchemaDescriptor,
};
pub use pipeline::{DeploymentPipeline, PipelineError, PipelineOutput};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
