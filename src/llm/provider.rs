//! Supported model providers

use clap::ValueEnum;
use genai::adapter::AdapterKind;
use std::fmt;

/// Supported LLM providers
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Ollama local inference
    Ollama,
    /// OpenAI GPT models
    #[value(name = "openai")]
    OpenAI,
    /// Anthropic Claude
    Claude,
    /// Google Gemini
    Gemini,
    /// xAI Grok
    Grok,
    /// Groq
    Groq,
}

impl Provider {
    /// Parses a provider name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name.trim(), true).ok()
    }

    /// genai adapter serving this provider
    pub fn adapter_kind(&self) -> AdapterKind {
        match self {
            Provider::Ollama => AdapterKind::Ollama,
            Provider::OpenAI => AdapterKind::OpenAI,
            Provider::Claude => AdapterKind::Anthropic,
            Provider::Gemini => AdapterKind::Gemini,
            Provider::Grok => AdapterKind::Xai,
            Provider::Groq => AdapterKind::Groq,
        }
    }

    /// Returns the provider name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama",
            Provider::Claude => "Claude",
            Provider::OpenAI => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Grok => "Grok",
            Provider::Groq => "Groq",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAI => write!(f, "openai"),
            Provider::Claude => write!(f, "claude"),
            Provider::Gemini => write!(f, "gemini"),
            Provider::Grok => write!(f, "grok"),
            Provider::Groq => write!(f, "groq"),
        }
    }
}
