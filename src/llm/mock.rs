use super::error::BackendError;
use super::invoker::ModelInvoker;
use super::types::{RawResult, SamplingOptions, SchemaDescriptor};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Deterministic invoker that replays queued responses in order.
pub struct MockInvoker {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    name: String,
}

#[derive(Debug, Clone)]
pub enum MockResponse {
    Structured(Value),
    Text(String),
    Error(BackendError),
}

impl MockResponse {
    pub fn structured(value: Value) -> Self {
        MockResponse::Structured(value)
    }

    pub fn text(content: impl Into<String>) -> Self {
        MockResponse::Text(content.into())
    }

    pub fn error(error: BackendError) -> Self {
        MockResponse::Error(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Structured,
    Text,
}

/// A request observed by the mock, kept for assertions
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub instruction: String,
    pub prompt: String,
    pub schema_name: Option<String>,
    pub options: SamplingOptions,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::with_name("MockLLM")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        let mut queue = self.responses.lock().unwrap();
        for response in responses {
            queue.push_back(response);
        }
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_response(&self, call: RecordedCall) -> Result<MockResponse, BackendError> {
        self.calls.lock().unwrap().push(call);
        match self.responses.lock().unwrap().pop_front() {
            Some(MockResponse::Error(error)) => Err(error),
            Some(response) => Ok(response),
            None => Err(BackendError::Other {
                message: "MockInvoker: No more responses in queue".to_string(),
            }),
        }
    }
}

impl Default for MockInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelInvoker for MockInvoker {
    async fn generate_structured(
        &self,
        instruction: &str,
        prompt: &str,
        shape: &SchemaDescriptor,
        options: SamplingOptions,
    ) -> Result<RawResult, BackendError> {
        let response = self.next_response(RecordedCall {
            kind: CallKind::Structured,
            instruction: instruction.to_string(),
            prompt: prompt.to_string(),
            schema_name: Some(shape.name.clone()),
            options,
        })?;

        match response {
            MockResponse::Structured(Value::Object(map)) => Ok(map),
            MockResponse::Structured(other) => Err(BackendError::InvalidResponse {
                message: "Expected a JSON object".to_string(),
                raw_response: Some(other.to_string()),
            }),
            MockResponse::Text(text) => super::response::parse_raw_result(&text),
            MockResponse::Error(error) => Err(error),
        }
    }

    async fn generate_text(
        &self,
        instruction: &str,
        prompt: &str,
        options: SamplingOptions,
    ) -> Result<String, BackendError> {
        let response = self.next_response(RecordedCall {
            kind: CallKind::Text,
            instruction: instruction.to_string(),
            prompt: prompt.to_string(),
            schema_name: None,
            options,
        })?;

        match response {
            MockResponse::Text(text) => Ok(text),
            MockResponse::Structured(value) => Ok(value.to_string()),
            MockResponse::Error(error) => Err(error),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInvoker")
            .field("name", &self.name)
            .field("remaining_responses", &self.remaining_responses())
            .finish()
    }
}
