//! OpenAI-compatible adapter for text completion.
//!
//! Supports OpenAI API, Azure OpenAI, and local Ollama instances.
//! Returns the model's reply text; validation happens in the domain layer.

use crate::domain::DomainError;
use crate::ports::{AiPort, CompletionRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// OpenAI-compatible AI adapter.
///
/// Can be configured to work with:
/// - OpenAI API (api.openai.com)
/// - Azure OpenAI
/// - Ollama (localhost)
/// - Any OpenAI-compatible API
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
    /// Create a new OpenAI adapter.
    ///
    /// # Arguments
    /// * `api_url` - API endpoint (e.g., "https://api.openai.com/v1/chat/completions")
    /// * `api_key` - API key (can be empty for local Ollama)
    /// * `model` - Model name (e.g., "gpt-4o-mini", "llama3.2")
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }

    /// Strip a surrounding markdown code fence (```json ... ``` or ``` ... ```).
    ///
    /// Anything else is returned trimmed but otherwise untouched, so prose around
    /// JSON still fails validation.
    fn strip_code_fence(raw_text: &str) -> String {
        let trimmed = raw_text.trim();
        let Some(rest) = trimmed.strip_prefix("```") else {
            return trimmed.to_string();
        };
        let body = rest.strip_prefix("json").unwrap_or(rest);
        match body.rfind("```") {
            Some(end_idx) => body[..end_idx].trim().to_string(),
            None => body.trim().to_string(),
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });
        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            response_format: request.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI API response structure.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    /// Null when the model refuses or only calls tools.
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl AiPort for OpenAiAdapter {
    async fn complete(&self, request: CompletionRequest) -> Result<String, DomainError> {
        info!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            json_mode = request.json_mode,
            "sending prompt to AI"
        );

        let body = self.build_request(&request);
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, url = %self.api_url, "AI API unreachable");
                DomainError::UpstreamUnavailable(format!("AI service unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "AI API returned error");
            return Err(DomainError::Upstream(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Upstream(format!("Failed to parse API response: {}", e)))?;

        // No choice or null content both read as an empty reply.
        let raw_content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(raw_len = raw_content.len(), "received AI completion");

        Ok(if request.json_mode {
            Self::strip_code_fence(&raw_content)
        } else {
            raw_content
        })
    }
}
