use super::error::BackendError;
use super::types::{RawResult, SamplingOptions, SchemaDescriptor};
use async_trait::async_trait;

/// Capability both pipeline stages depend on to reach the generative backend.
///
/// Implementations must be stateless with respect to callers: concurrent
/// calls share nothing mutable.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Requests a JSON object constrained to `shape`.
    ///
    /// How strictly the backend honours the schema is its own concern; the
    /// returned object is untrusted.
    async fn generate_structured(
        &self,
        instruction: &str,
        prompt: &str,
        shape: &SchemaDescriptor,
        options: SamplingOptions,
    ) -> Result<RawResult, BackendError>;

    /// Requests an unconstrained text completion.
    async fn generate_text(
        &self,
        instruction: &str,
        prompt: &str,
        options: SamplingOptions,
    ) -> Result<String, BackendError>;

    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoInvoker;

    #[async_trait]
    impl ModelInvoker for EchoInvoker {
        async fn generate_structured(
            &self,
            _instruction: &str,
            prompt: &str,
            _shape: &SchemaDescriptor,
            _options: SamplingOptions,
        ) -> Result<RawResult, BackendError> {
            let mut result = RawResult::new();
            result.insert("prompt".to_string(), json!(prompt));
            Ok(result)
        }

        async fn generate_text(
            &self,
            _instruction: &str,
            prompt: &str,
            _options: SamplingOptions,
        ) -> Result<String, BackendError> {
            Ok(prompt.to_string())
        }

        fn name(&self) -> &str {
            "Echo"
        }
    }

    #[tokio::test]
    async fn test_invoker_trait() {
        let invoker = EchoInvoker;
        assert_eq!(invoker.name(), "Echo");
        assert!(invoker.model_info().is_none());

        let text = invoker
            .generate_text("sys", "hello", SamplingOptions::with_temperature(0.2))
            .await
            .unwrap();
        assert_eq!(text, "hello");

        let shape = SchemaDescriptor::new("s", json!({}));
        let structured = invoker
            .generate_structured("sys", "hi", &shape, SamplingOptions::with_temperature(0.1))
            .await
            .unwrap();
        assert_eq!(structured["prompt"], "hi");
    }
}
