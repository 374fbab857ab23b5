//! # Model Provider Interface
//!
//! A trait-based abstraction for talking to multimodal LLM backends.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - Implementations for Gemini and OpenAI-compatible APIs
//! - Messages are ordered lists of parts: text, optionally paired with an inline image
//! - One request, one response: no streaming, no retry
//! - Usage tracking

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use redraw_error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Core Types
// ============================================================================

/// An image carried inline in a request, already base64-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    pub fn png(bytes: &[u8]) -> Self {
        Self::new("image/png", bytes)
    }

    /// `data:` URL form, as used by OpenAI-style `image_url` parts
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One part of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { image: InlineImage },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(image: InlineImage) -> Self {
        ContentPart::Image { image }
    }
}

/// A chat message: a role and an ordered list of parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            parts: vec![ContentPart::text(content)],
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![ContentPart::text(content)],
        }
    }

    /// A user message with text followed by an image
    pub fn user_with_image(content: impl Into<String>, image: InlineImage) -> Self {
        Self {
            role: Role::User,
            parts: vec![ContentPart::text(content), ContentPart::image(image)],
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![ContentPart::text(content)],
        }
    }

    /// All text parts joined together
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn images(&self) -> impl Iterator<Item = &InlineImage> {
        self.parts.iter().filter_map(|p| match p {
            ContentPart::Image { image } => Some(image),
            ContentPart::Text { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the model only when one is given
    pub fn with_model_opt(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model {
            self.model = Some(model.to_string());
        }
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    /// Generated text; `None` when the model produced no text parts
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Errors
// ============================================================================

#[derive(Debug, Clone)]
pub enum ProviderError {
    Network(String),
    Api { status: u16, message: String },
    Parse(String),
    RateLimited,
    ModelNotFound(String),
    AuthenticationFailed,
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited => write!(f, "Rate limited"),
            Self::ModelNotFound(m) => write!(f, "Model not found: {}", m),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Map an HTTP error status and body to a provider error
    pub(crate) fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            429 => ProviderError::RateLimited,
            401 | 403 => ProviderError::AuthenticationFailed,
            404 => ProviderError::ModelNotFound(model.to_string()),
            _ => ProviderError::Api { status, message: body },
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g. "gemini", "openai")
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    /// Send a completion request and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

/// Any provider this crate ships, chosen at runtime from a `ProviderConfig`
pub enum Provider {
    Gemini(GeminiProvider),
    OpenAI(OpenAIProvider),
}

impl Provider {
    pub fn from_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        match config.provider_type {
            ProviderType::Gemini => Ok(Provider::Gemini(GeminiProvider::new(config)?)),
            ProviderType::OpenAI | ProviderType::Local => {
                Ok(Provider::OpenAI(OpenAIProvider::new(config)?))
            }
        }
    }
}

impl LlmProvider for Provider {
    fn name(&self) -> &str {
        match self {
            Provider::Gemini(p) => p.name(),
            Provider::OpenAI(p) => p.name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Provider::Gemini(p) => p.default_model(),
            Provider::OpenAI(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        match self {
            Provider::Gemini(p) => p.complete(request).await,
            Provider::OpenAI(p) => p.complete(request).await,
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

pub const GEMINI_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    /// Request timeout; `None` waits for as long as the server takes
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    OpenAI,
    /// OpenAI-compatible server that needs no key (Ollama, vLLM, ...)
    Local,
}

impl ProviderType {
    /// Environment variable holding the credential, if this provider needs one
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::Gemini => Some(GEMINI_API_KEY_ENV),
            ProviderType::OpenAI => Some(OPENAI_API_KEY_ENV),
            ProviderType::Local => None,
        }
    }
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key: Some(api_key.into()),
            base_url: Some(GEMINI_BASE_URL.into()),
            default_model: Some(GEMINI_DEFAULT_MODEL.into()),
            timeout_secs: None,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some(OPENAI_BASE_URL.into()),
            default_model: Some(OPENAI_DEFAULT_MODEL.into()),
            timeout_secs: None,
        }
    }

    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            timeout_secs: None,
        }
    }

    /// Build a config for `provider_type`, reading its credential from the environment.
    ///
    /// An unset or empty variable is a `ConfigInvalid` error. `Local` needs no
    /// credential and points at an Ollama-style server on localhost.
    pub fn from_env(provider_type: ProviderType) -> redraw_error::Result<Self> {
        Self::from_lookup(provider_type, |var| std::env::var(var).ok())
    }

    /// Same as `from_env`, with the variable lookup supplied by the caller
    pub fn from_lookup(
        provider_type: ProviderType,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> redraw_error::Result<Self> {
        let key = match provider_type.credential_env() {
            Some(var) => match lookup(var) {
                Some(key) if !key.trim().is_empty() => Some(key),
                _ => return Err(Error::missing_env(var).with_operation("provider::from_env")),
            },
            None => None,
        };

        Ok(match (provider_type, key) {
            (ProviderType::Gemini, Some(key)) => Self::gemini(key),
            (ProviderType::OpenAI, Some(key)) => Self::openai(key),
            _ => Self::local("http://localhost:11434/v1", "llava"),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Build the shared HTTP client for a provider
pub(crate) fn http_client(config: &ProviderConfig) -> Result<reqwest::Client, ProviderError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(std::time::Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {}", e)))
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================
