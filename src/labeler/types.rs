//! Core types for the extraction labeler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Model provider backing the labeler. A closed set: adding a provider
/// means adding a variant and its wire mapping, not registering a string
/// key at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    DeepSeek,
    Gemini,
    Claude,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4.1-2025-04-14",
            Self::DeepSeek => "deepseek-reasoner",
            Self::Gemini => "gemini-2.0-flash",
            Self::Claude => "claude-3-opus-20240229",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Claude => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Claude => "https://api.anthropic.com",
        }
    }
}

/// Labeler configuration. `model` falls back to the provider default.
#[derive(Debug, Clone)]
pub struct LabelerConfig {
    pub provider: Provider,
    pub model: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: None,
            temperature: 0.0,
            timeout: Duration::from_secs(15),
        }
    }
}

impl LabelerConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn resolved_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

// =============================================================================
// TESTS
// =============================================================================
