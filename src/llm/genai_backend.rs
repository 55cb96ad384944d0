//! GenAI-based model invoker
//!
//! This module provides a `ModelInvoker` implementation using the `genai` crate,
//! supporting multiple providers (Ollama, OpenAI, Claude, Gemini, Grok, Groq).

use super::error::BackendError;
use super::invoker::ModelInvoker;
use super::provider::Provider;
use super::response::parse_raw_result;
use super::types::{RawResult, SamplingOptions, SchemaDescriptor};
use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatResponseFormat, JsonSpec};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// GenAI-based invoker supporting multiple providers
///
/// This invoker is thread-safe and can be shared across tasks using `Arc`.
pub struct GenAIInvoker {
    /// GenAI client instance
    client: Client,
    /// Model name, without provider prefix
    model: String,
    /// Provider type
    provider: Provider,
    /// Request timeout
    timeout: Duration,
}

impl GenAIInvoker {
    /// Creates a new invoker
    ///
    /// Credentials are read by genai from the provider's standard environment
    /// variable (`GEMINI_API_KEY`, `OPENAI_API_KEY`, ...). When `endpoint` is
    /// set, every request is routed there instead of the provider default.
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        timeout: Duration,
        endpoint: Option<String>,
    ) -> Self {
        let model = model.into();

        let client = if let Some(endpoint_url) = endpoint {
            debug!(
                "Using custom endpoint for {}: {}",
                provider.name(),
                endpoint_url
            );

            let adapter = provider.adapter_kind();
            let model_clone = model.clone();

            let resolver = ServiceTargetResolver::from_resolver_fn(
                move |_service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                    let endpoint = Endpoint::from_owned(endpoint_url.clone());

                    let auth = match adapter.default_key_env_name() {
                        Some(api_key_var) => AuthData::from_env(api_key_var),
                        None => AuthData::from_single(""),
                    };

                    Ok(ServiceTarget {
                        endpoint,
                        auth,
                        model: ModelIden::new(adapter, &model_clone),
                    })
                },
            );

            Client::builder()
                .with_service_target_resolver(resolver)
                .build()
        } else {
            Client::default()
        };

        debug!(
            "Creating GenAI invoker: provider={}, model={}",
            provider.name(),
            model,
        );

        Self {
            client,
            model,
            provider,
            timeout,
        }
    }

    async fn exec(
        &self,
        instruction: &str,
        prompt: &str,
        options: ChatOptions,
    ) -> Result<String, BackendError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(instruction),
            ChatMessage::user(prompt),
        ]);

        debug!(
            "Sending request to {}: prompt_length={}",
            self.provider.name(),
            prompt.len()
        );

        let start = Instant::now();

        let response = match tokio::time::timeout(
            self.timeout,
            self.client.exec_chat(&self.model, request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("{} API error: {}", self.provider.name(), e);
                return Err(classify_error(self.provider, &e.to_string()));
            }
            Err(_) => {
                error!(
                    "{} request timed out after {}s",
                    self.provider.name(),
                    self.timeout.as_secs()
                );
                return Err(BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        info!(
            "{} completion finished in {:.2}s",
            self.provider.name(),
            start.elapsed().as_secs_f64()
        );

        let content = response
            .first_text()
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "No text content in response".to_string(),
                raw_response: None,
            })?
            .to_string();

        debug!(
            "{} response length: {} characters",
            self.provider.name(),
            content.len()
        );

        Ok(content)
    }
}

fn chat_options(options: SamplingOptions) -> ChatOptions {
    let chat_options = ChatOptions::default().with_temperature(options.temperature as f64);
    match options.max_tokens {
        Some(max_tokens) => chat_options.with_max_tokens(max_tokens),
        None => chat_options,
    }
}

/// Maps a provider failure message onto the backend taxonomy.
fn classify_error(provider: Provider, message: &str) -> BackendError {
    let lowered = message.to_lowercase();
    if lowered.contains("429") || lowered.contains("rate limit") {
        BackendError::RateLimitError { retry_after: None }
    } else if lowered.contains("401")
        || lowered.contains("403")
        || lowered.contains("api key")
        || lowered.contains("unauthorized")
    {
        BackendError::AuthenticationError {
            message: format!("{} rejected credentials: {}", provider.name(), message),
        }
    } else {
        BackendError::ApiError {
            message: format!("{} request failed: {}", provider.name(), message),
            status_code: None,
        }
    }
}

#[async_trait]
impl ModelInvoker for GenAIInvoker {
    async fn generate_structured(
        &self,
        instruction: &str,
        prompt: &str,
        shape: &SchemaDescriptor,
        options: SamplingOptions,
    ) -> Result<RawResult, BackendError> {
        let options = chat_options(options).with_response_format(ChatResponseFormat::JsonSpec(
            JsonSpec::new(shape.name.clone(), shape.schema.clone()),
        ));

        let content = self.exec(instruction, prompt, options).await?;
        parse_raw_result(&content)
    }

    async fn generate_text(
        &self,
        instruction: &str,
        prompt: &str,
        options: SamplingOptions,
    ) -> Result<String, BackendError> {
        self.exec(instruction, prompt, chat_options(options)).await
    }

    fn name(&self) -> &str {
        self.provider.name()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAIInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIInvoker")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoker_creation() {
        let invoker = GenAIInvoker::new(
            Provider::Gemini,
            "gemini-2.5-flash",
            Duration::from_secs(30),
            None,
        );

        assert_eq!(invoker.name(), "Gemini");
        assert_eq!(invoker.model_info(), Some("gemini-2.5-flash".to_string()));
    }

    #[test]
    fn test_invoker_with_custom_endpoint() {
        let invoker = GenAIInvoker::new(
            Provider::Ollama,
            "qwen2.5-coder:7b",
            Duration::from_secs(120),
            Some("http://localhost:11434/".to_string()),
        );

        assert_eq!(invoker.timeout, Duration::from_secs(120));
        assert_eq!(invoker.provider, Provider::Ollama);
    }

    #[test]
    fn test_classify_error() {
        assert!(matches!(
            classify_error(Provider::Gemini, "HTTP 429 Too Many Requests"),
            BackendError::RateLimitError { .. }
        ));
        assert!(matches!(
            classify_error(Provider::OpenAI, "401 Unauthorized"),
            BackendError::AuthenticationError { .. }
        ));
        assert!(matches!(
            classify_error(Provider::Claude, "connection reset"),
            BackendError::ApiError { .. }
        ));
    }

    #[test]
    fn test_debug_impl() {
        let invoker = GenAIInvoker::new(
            Provider::Ollama,
            "qwen2.5-coder:7b",
            Duration::from_secs(30),
            None,
        );

        let debug_str = format!("{:?}", invoker);
        assert!(debug_str.contains("GenAIInvoker"));
        assert!(debug_str.contains("Ollama"));
    }
}
