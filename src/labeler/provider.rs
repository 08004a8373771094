//! HTTP adapters for the supported model providers.
//!
//! One adapter, four wire mappings: OpenAI and DeepSeek speak the
//! chat-completions format, Claude speaks the Anthropic messages API, and
//! Gemini speaks generateContent. Each mapping is a private method on
//! [`HttpLabeler`], dispatched by the closed [`Provider`] enum.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::error::LabelerError;
use super::types::{LabelerConfig, Provider};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_COMPLETION_TOKENS: u32 = 2_048;

/// Trait for a single system+user chat call returning raw text.
#[async_trait]
pub trait ChatLabeler: Send + Sync {
    async fn chat(&self, system: &str, user: &str) -> Result<String, LabelerError>;
}

/// Reqwest-backed labeler for all supported providers.
#[derive(Debug, Clone)]
pub struct HttpLabeler {
    client: reqwest::Client,
    config: LabelerConfig,
    api_key: String,
    base_url: String,
}

impl HttpLabeler {
    /// Create with an explicit API key and base URL (tests point this at a
    /// mock server).
    pub fn with_config(
        config: LabelerConfig,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, LabelerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LabelerError::Http)?;
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    /// Create from the provider's API-key environment variable.
    pub fn from_env(config: LabelerConfig) -> Result<Self, LabelerError> {
        let env = config.provider.api_key_env();
        let api_key = std::env::var(env)
            .map_err(|_| LabelerError::config(format!("{env} not set")))?;
        let base_url = config.provider.default_base_url().to_string();
        Self::with_config(config, api_key, base_url)
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    pub fn model(&self) -> &str {
        self.config.resolved_model()
    }

    async fn chat_completions(&self, system: &str, user: &str) -> Result<String, LabelerError> {
        let provider = self.config.provider.as_str();
        let body = ChatCompletionsRequest {
            model: self.model(),
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: system,
                },
                ApiMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            max_completion_tokens: MAX_COMPLETION_TOKENS,
            seed: 0,
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| LabelerError::config("API key contains invalid header characters"))?;
        headers.insert(AUTHORIZATION, auth);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let parsed: ChatCompletionsResponse = resp.json().await?;
        if let Some(error) = parsed.error {
            return Err(provider_error(provider, status, error.message));
        }
        parsed
            .choices
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
            .ok_or(LabelerError::EmptyResponse)
    }

    async fn anthropic_messages(&self, system: &str, user: &str) -> Result<String, LabelerError> {
        let body = AnthropicRequest {
            model: self.model(),
            system,
            messages: vec![ApiMessage {
                role: "user",
                content: user,
            }],
            temperature: self.config.temperature,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let parsed: AnthropicResponse = resp.json().await?;
        if let Some(error) = parsed.error {
            return Err(provider_error("claude", status, error.message));
        }
        parsed
            .content
            .and_then(|mut c| c.drain(..).next())
            .and_then(|b| b.text)
            .filter(|t| !t.is_empty())
            .ok_or(LabelerError::EmptyResponse)
    }

    async fn gemini_generate(&self, system: &str, user: &str) -> Result<String, LabelerError> {
        let body = GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart { text: system }],
            },
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: user }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: MAX_COMPLETION_TOKENS,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.model(),
            self.api_key
        );
        let resp = self.client.post(url).json(&body).send().await?;

        let status = resp.status();
        let parsed: GeminiResponse = resp.json().await?;
        if let Some(error) = parsed.error {
            return Err(provider_error("gemini", status, error.message));
        }
        parsed
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|mut c| c.parts.drain(..).next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or(LabelerError::EmptyResponse)
    }
}

#[async_trait]
impl ChatLabeler for HttpLabeler {
    async fn chat(&self, system: &str, user: &str) -> Result<String, LabelerError> {
        match self.config.provider {
            Provider::OpenAi | Provider::DeepSeek => self.chat_completions(system, user).await,
            Provider::Claude => self.anthropic_messages(system, user).await,
            Provider::Gemini => self.gemini_generate(system, user).await,
        }
    }
}

fn provider_error(
    provider: &'static str,
    status: reqwest::StatusCode,
    message: Option<String>,
) -> LabelerError {
    LabelerError::provider(
        provider,
        message.unwrap_or_else(|| format!("HTTP {status}")),
    )
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    seed: u64,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Option<Vec<AnthropicBlock>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}
