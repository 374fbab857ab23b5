//! Google Gemini provider implementation
//!
//! Talks to the `generateContent` REST endpoint. Images travel as
//! `inline_data` parts next to the text.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = http_client(&config)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL)
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url().trim_end_matches('/'),
            model
        )
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or(GEMINI_DEFAULT_MODEL)
    }

    #[tracing::instrument(skip_all, fields(model = tracing::field::Empty))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        tracing::Span::current().record("model", model.as_str());

        let api_request = GeminiRequest::from(&request);

        let mut req = self.client.post(self.endpoint(&model)).json(&api_request);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() {
                req = req.header("x-goog-api-key", api_key);
            }
        }

        let response = req.send().await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, text, &model));
        }

        let api_response: GeminiResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        api_response.into_completion(&model)
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl From<&CompletionRequest> for GeminiRequest {
    fn from(request: &CompletionRequest) -> Self {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => system_parts.extend(msg.parts.iter().map(GeminiPart::from)),
                Role::User | Role::Assistant => contents.push(GeminiContent {
                    role: Some(if msg.role == Role::User { "user" } else { "model" }.into()),
                    parts: msg.parts.iter().map(GeminiPart::from).collect(),
                }),
            }
        }

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| GeminiContent {
                role: None,
                parts: system_parts,
            }),
            generation_config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiBlob>,
}

impl From<&ContentPart> for GeminiPart {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text { text } => Self {
                text: Some(text.clone()),
                inline_data: None,
            },
            ContentPart::Image { image } => Self {
                text: None,
                inline_data: Some(GeminiBlob {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
    response_id: Option<String>,
}

impl GeminiResponse {
    fn into_completion(self, requested_model: &str) -> Result<CompletionResponse, ProviderError> {
        let candidate = self.candidates.into_iter().next()
            .ok_or_else(|| ProviderError::Other("No candidates in response".into()))?;

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let content = (!texts.is_empty()).then(|| texts.concat());

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Unknown,
        };

        let usage = self.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }).unwrap_or_default();

        Ok(CompletionResponse {
            id: self.response_id.unwrap_or_default(),
            model: self.model_version.unwrap_or_else(|| requested_model.to_string()),
            content,
            finish_reason,
            usage,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}
