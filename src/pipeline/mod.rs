//! Two-stage composition: repository analysis followed by Dockerfile generation

pub mod deployment;

pub use deployment::{DeploymentPipeline, PipelineError, PipelineOutput};
