//! OpenAI-compatible provider implementation
//!
//! Works with OpenAI, Azure OpenAI, vLLM, Ollama, and other OpenAI-compatible APIs.
//! Images are sent as `image_url` parts carrying a `data:` URL.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = http_client(&config)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL)
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        match self.config.provider_type {
            ProviderType::Local => "local",
            _ => "openai",
        }
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or(OPENAI_DEFAULT_MODEL)
    }

    #[tracing::instrument(skip_all, fields(model = tracing::field::Empty))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(self.default_model()).to_string();
        tracing::Span::current().record("model", model.as_str());

        let api_request = OpenAIRequest {
            model: model.clone(),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut req = self.client
            .post(format!("{}/chat/completions", self.base_url().trim_end_matches('/')))
            .json(&api_request);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }
        }

        let response = req.send().await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, text, &model));
        }

        let api_response: OpenAIResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        api_response.into_completion()
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: Vec<OpenAIContentPart>,
}

impl From<&ChatMessage> for OpenAIMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: msg.parts.iter().map(|part| match part {
                ContentPart::Text { text } => OpenAIContentPart::Text { text: text.clone() },
                ContentPart::Image { image } => OpenAIContentPart::ImageUrl {
                    image_url: OpenAIImageUrl { url: image.data_url() },
                },
            }).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize)]
struct OpenAIImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

impl OpenAIResponse {
    fn into_completion(self) -> Result<CompletionResponse, ProviderError> {
        let choice = self.choices.into_iter().next()
            .ok_or_else(|| ProviderError::Other("No choices in response".into()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        let usage = self.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }).unwrap_or_default();

        Ok(CompletionResponse {
            id: self.id,
            model: self.model,
            content: choice.message.content,
            finish_reason,
            usage,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_with_image_uses_data_url() {
        let msg = ChatMessage::user_with_image("identify", InlineImage::png(b"hello"));
        let body = serde_json::to_value(OpenAIMessage::from(&msg)).unwrap();
        assert_eq!(
            body,
            json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": "identify" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,aGVsbG8=" } }
                ]
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "message": { "role": "assistant", "content": "<svg></svg>" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12 }
        });

        let response: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.id, "chatcmpl-1");
        assert_eq!(completion.content.as_deref(), Some("<svg></svg>"));
        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.usage.total_tokens, 12);
    }

    #[test]
    fn test_response_with_null_content() {
        let raw = json!({
            "choices": [{ "message": { "content": null }, "finish_reason": "content_filter" }]
        });

        let response: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.content, None);
        assert_eq!(completion.finish_reason, FinishReason::ContentFilter);
    }

    #[test]
    fn test_name_depends_on_provider_type() {
        let local = OpenAIProvider::new(ProviderConfig::local("http://localhost:11434/v1", "llava")).unwrap();
        assert_eq!(local.name(), "local");
        assert_eq!(local.default_model(), "llava");

        let openai = OpenAIProvider::new(ProviderConfig::openai("sk-test")).unwrap();
        assert_eq!(openai.name(), "openai");
    }
}
