//! Anthropic Claude client implementation

use crate::config::{ModelParams, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    params: ModelParams,
    headers: HashMap<String, String>,
}

impl AnthropicClient {
    /// Create a new Anthropic client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Anthropic".to_string(),
            }
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::InvalidRequest {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            params: config.params.clone(),
            headers: config.headers.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, options);

        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anthropic API call failed: {} - {}", status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Authentication {
                    message: error_text,
                },
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimit,
                _ => LlmError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                },
            }
            .into());
        }

        let anthropic_response: AnthropicResponse =
            response.json().await.map_err(|e| LlmError::Network {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.convert_response(anthropic_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

impl AnthropicClient {
    fn build_request(&self, messages: Vec<LlmMessage>, options: Option<ChatOptions>) -> AnthropicRequest {
        let options = options.unwrap_or_else(|| self.params.clone().into());

        // Anthropic takes the system prompt as a top-level field
        let mut system = None;
        let mut conversation = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system = Some(message.content),
                MessageRole::User => conversation.push(AnthropicMessage {
                    role: "user",
                    content: message.content,
                }),
                MessageRole::Assistant => conversation.push(AnthropicMessage {
                    role: "assistant",
                    content: message.content,
                }),
            }
        }

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens.or(self.params.max_tokens).unwrap_or(250),
            temperature: options.temperature.or(self.params.temperature),
            top_p: options.top_p,
            system,
            messages: conversation,
            stop_sequences: options.stop,
        }
    }

    fn convert_response(&self, response: AnthropicResponse) -> LlmResponse {
        let text = response
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        let finish_reason = response.stop_reason.map(|reason| match reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" => FinishReason::Length,
            _ => FinishReason::Other(reason),
        });

        LlmResponse {
            message: LlmMessage::assistant(text),
            usage,
            model: response.model,
            finish_reason,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicContent>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;

    fn client() -> AnthropicClient {
        let config = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com/".to_string(),
            "sk-ant-test".to_string(),
            "claude-3-5-haiku-latest".to_string(),
        );
        AnthropicClient::new(&config).unwrap()
    }

    #[test]
    fn test_build_request_lifts_system_prompt() {
        let request = client().build_request(
            vec![LlmMessage::system("be brief"), LlmMessage::user("hi")],
            None,
        );

        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.max_tokens, 250);
        assert_eq!(request.temperature, Some(0.2));
    }

    #[test]
    fn test_convert_response_joins_text_blocks() {
        let response: AnthropicResponse = serde_json::from_value(serde_json::json!({
            "model": "claude-3-5-haiku-latest",
            "content": [
                {"type": "text", "text": "Paris"},
                {"type": "text", "text": "is the capital."}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }))
        .unwrap();

        let converted = client().convert_response(response);
        assert_eq!(converted.message.content, "Paris\nis the capital.");
        assert_eq!(converted.finish_reason, Some(FinishReason::Stop));
        assert_eq!(converted.usage.unwrap().total_tokens, 14);
    }
}
