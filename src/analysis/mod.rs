//! Stage 1: repository analysis
//!
//! Raw repository signals are rendered into a prompt, the backend returns a
//! loosely-shaped JSON object, and [`ResultNormalizer`] followed by
//! [`SchemaValidator`] narrow it into an [`AnalysisProfile`].

pub mod analyzer;
pub mod normalize;
pub mod prompt;
pub mod schema;
pub mod types;

pub use analyzer::{AnalysisError, AnalyzerConfig, RepositoryAnalyzer};
pub use normalize::{NormalizationContext, ResultNormalizer};
pub use prompt::{PromptBuilder, PromptLimits};
pub use schema::{profile_schema, SchemaValidator, SchemaViolation};
pub use types::{AnalysisProfile, FileDescriptor, LanguageFamily, RawRepositoryData};
