//! Error handling integration tests
//!
//! Covers the failure taxonomy surfaced to callers:
//! - Backend failures, tagged with the stage that hit them
//! - Schema violations naming the missing field
//! - Unusable artifacts (too short, no base image)
//! - Caller deadlines
//! - Configuration errors

use async_trait::async_trait;
use dockgen::llm::CallKind;
use dockgen::{
    AnalysisError, ArtifactGenerator, BackendError, ConfigError, DeploymentPipeline,
    DockgenConfig, GenerationError, MockInvoker, MockResponse, ModelInvoker, PipelineError,
    RawRepositoryData, RawResult, RepositoryAnalyzer, SamplingOptions, SchemaDescriptor,
    SchemaViolation,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn repo() -> RawRepositoryData {
    RawRepositoryData::new("acme", "worker")
        .with_files(["requirements.txt", "worker.py"])
        .with_package_file("requirements.txt", "celery==5.3.6")
}

fn pipeline(responses: Vec<MockResponse>) -> DeploymentPipeline {
    let mock = Arc::new(MockInvoker::new());
    mock.add_responses(responses);
    DeploymentPipeline::with_invoker(mock, &DockgenConfig::default())
}

#[tokio::test]
async fn test_backend_error_in_analysis() {
    let pipeline = pipeline(vec![MockResponse::error(BackendError::ApiError {
        message: "upstream overloaded".to_string(),
        status_code: Some(503),
    })]);

    let err = pipeline.run(&repo()).await.unwrap_err();

    assert_eq!(err.stage(), "analysis");
    assert!(err.is_retryable());
    match err {
        PipelineError::Analysis(AnalysisError::Backend(BackendError::ApiError {
            status_code,
            ..
        })) => assert_eq!(status_code, Some(503)),
        other => panic!("Expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_authentication_error_is_not_retryable() {
    let pipeline = pipeline(vec![
        MockResponse::structured(json!({
            "language": "Python",
            "start_command": "celery -A worker worker"
        })),
        MockResponse::error(BackendError::AuthenticationError {
            message: "API key revoked".to_string(),
        }),
    ]);

    let err = pipeline.run(&repo()).await.unwrap_err();

    assert_eq!(err.stage(), "generation");
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("API key revoked"));
}

#[tokio::test]
async fn test_schema_violation_names_field() {
    let analyzer = RepositoryAnalyzer::new(Arc::new({
        let mock = MockInvoker::new();
        mock.add_response(MockResponse::structured(json!({
            "language": "Python",
            "package_manager": "pip",
            "start_command": ""
        })));
        mock
    }));

    let err = analyzer.analyze(&repo()).await.unwrap_err();

    assert_eq!(err.field(), Some("start_command"));
    assert!(matches!(
        err,
        AnalysisError::SchemaViolation(SchemaViolation::MissingField { .. })
            | AnalysisError::SchemaViolation(SchemaViolation::EmptyField { .. })
    ));
}

#[tokio::test]
async fn test_wrong_type_is_a_violation() {
    let mock = Arc::new(MockInvoker::new());
    mock.add_response(MockResponse::structured(json!({
        "language": ["Python"],
        "package_manager": "pip",
        "start_command": "python worker.py"
    })));

    let err = RepositoryAnalyzer::new(mock)
        .analyze(&repo())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::SchemaViolation(SchemaViolation::InvalidType { .. })
    ));
    assert_eq!(err.field(), Some("language"));
}

#[tokio::test]
async fn test_non_json_structured_response() {
    let mock = Arc::new(MockInvoker::new());
    mock.add_response(MockResponse::text("Sorry, I can't analyze this repository."));

    let err = RepositoryAnalyzer::new(mock)
        .analyze(&repo())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::Backend(BackendError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_short_artifact_is_never_passed_through() {
    let mock = Arc::new(MockInvoker::new());
    mock.add_response(MockResponse::text("FROM python:3.11-slim\nCMD [\"python\"]"));

    let generator = ArtifactGenerator::new(mock.clone());
    let profile = serde_json::from_value(json!({
        "language": "Python",
        "package_manager": "pip",
        "start_command": "python worker.py"
    }))
    .unwrap();

    let err = generator.generate(&profile).await.unwrap_err();

    match err {
        GenerationError::TooShort { length, minimum } => {
            assert!(length < minimum);
            assert_eq!(minimum, 300);
        }
        other => panic!("Expected TooShort, got {:?}", other),
    }
    assert_eq!(mock.calls()[0].kind, CallKind::Text);
}

#[tokio::test]
async fn test_missing_base_image_is_never_repaired() {
    let prose = "To containerize this worker you should pick a slim Python image, \
                 install requirements with pip, copy the sources and run celery. "
        .repeat(4);
    let pipeline = pipeline(vec![
        MockResponse::structured(json!({
            "language": "Python",
            "start_command": "celery -A worker worker"
        })),
        MockResponse::text(prose),
    ]);

    let err = pipeline.run(&repo()).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Generation(GenerationError::MissingBaseImage)
    ));
}

/// Backend that never answers in time
struct StalledInvoker;

#[async_trait]
impl ModelInvoker for StalledInvoker {
    async fn generate_structured(
        &self,
        _instruction: &str,
        _prompt: &str,
        _shape: &SchemaDescriptor,
        _options: SamplingOptions,
    ) -> Result<RawResult, BackendError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(RawResult::new())
    }

    async fn generate_text(
        &self,
        _instruction: &str,
        _prompt: &str,
        _options: SamplingOptions,
    ) -> Result<String, BackendError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "Stalled"
    }
}

#[tokio::test]
async fn test_deadline_surfaces_timeout() {
    let pipeline =
        DeploymentPipeline::with_invoker(Arc::new(StalledInvoker), &DockgenConfig::default());

    let err = pipeline
        .run_with_deadline(&repo(), Duration::from_millis(50))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), "analysis");
    assert!(matches!(
        err,
        PipelineError::Analysis(AnalysisError::Backend(BackendError::TimeoutError { .. }))
    ));
}

#[tokio::test]
async fn test_generation_deadline_surfaces_timeout() {
    let generator = ArtifactGenerator::new(Arc::new(StalledInvoker));
    let profile = serde_json::from_value(json!({
        "language": "Go",
        "package_manager": "go mod",
        "start_command": "/worker"
    }))
    .unwrap();

    let err = generator
        .generate_with_deadline(&profile, Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GenerationError::Backend(BackendError::TimeoutError { .. })
    ));
    assert!(err.is_retryable());
}

#[test]
fn test_invalid_configuration() {
    let config = DockgenConfig {
        request_timeout_secs: 0,
        ..Default::default()
    };

    match config.validate() {
        Err(ConfigError::ValidationFailed(message)) => {
            assert!(message.contains("timeout"));
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }
}
