//! Model invocation layer
//!
//! Both pipeline stages reach the generative backend only through the
//! [`ModelInvoker`] trait, so a GenAI-backed invoker and the deterministic
//! [`MockInvoker`] are interchangeable.

mod error;
mod genai_backend;
mod invoker;
mod mock;
mod provider;
pub mod response;
mod types;

pub use error::BackendError;
pub use genai_backend::GenAIInvoker;
pub use invoker::ModelInvoker;
pub use mock::{CallKind, MockInvoker, MockResponse, RecordedCall};
pub use provider::Provider;
pub use types::{RawResult, SamplingOptions, SchemaDescriptor};
