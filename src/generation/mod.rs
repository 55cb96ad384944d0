//! Stage 2: Dockerfile generation
//!
//! The backend produces free-form text which is cleaned up and checked for
//! load-bearing directives. A missing `CMD`/`ENTRYPOINT` is repaired with a
//! language-specific default; a short artifact or one without a base image
//! is rejected.

pub mod cleanup;
pub mod directives;
pub mod generator;
mod prompt;

pub use cleanup::strip_formatting;
pub use directives::{default_start_directive, parse_instructions, Directive, DirectiveReport, Instruction};
pub use generator::{ArtifactGenerator, BuildArtifact, GenerationError, GeneratorConfig};
