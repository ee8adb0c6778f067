//! OpenAI-compatible client implementation using async-openai library
//!
//! Covers OpenAI itself and any compatible endpoint such as OpenRouter.

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage,
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI client using async-openai library
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for OpenAI-compatible provider".to_string(),
            }
            .into());
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        // Set custom base URL if provided
        let base_url = config.base_url.trim_end_matches('/');
        if base_url != "https://api.openai.com/v1" {
            openai_config = openai_config.with_api_base(base_url);
        }

        // Extra headers (OpenRouter's HTTP-Referer / X-Title) ride on the HTTP client
        let http = reqwest::Client::builder()
            .default_headers(Self::build_headers(config)?)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::InvalidRequest {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let client = Client::with_config(openai_config).with_http_client(http);

        Ok(Self {
            client,
            model: config.model.clone(),
        })
    }

    fn build_headers(config: &ResolvedLlmConfig) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                LlmError::InvalidRequest {
                    message: format!("Invalid header name: {}", key),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| LlmError::InvalidRequest {
                message: format!("Invalid value for header: {}", key),
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// Convert our internal message format to async-openai format
    fn convert_messages(&self, messages: Vec<LlmMessage>) -> Vec<ChatCompletionRequestMessage> {
        messages
            .into_iter()
            .map(|message| match message.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            message.content,
                        )),
                        ..Default::default()
                    })
                }
            })
            .collect()
    }

    fn map_error(error: OpenAIError) -> LlmError {
        match error {
            OpenAIError::Reqwest(e) => LlmError::Network {
                message: e.to_string(),
            },
            other => LlmError::ApiError {
                status: 500, // async-openai doesn't expose status codes directly
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(self.convert_messages(messages));

        if let Some(opts) = options {
            if let Some(max_tokens) = opts.max_tokens {
                request_builder.max_tokens(max_tokens);
            }
            if let Some(temperature) = opts.temperature {
                request_builder.temperature(temperature);
            }
            if let Some(top_p) = opts.top_p {
                request_builder.top_p(top_p);
            }
            if let Some(stop) = opts.stop {
                request_builder.stop(async_openai::types::Stop::StringArray(stop));
            }
        }

        let request = request_builder.build().map_err(|e| {
            tracing::error!("Failed to build OpenAI request: {}", e);
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
        })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!("OpenAI API call failed: {}", e);
            Self::map_error(e)
        })?;

        self.convert_response(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

impl OpenAiClient {
    /// Convert async-openai response to our internal format
    fn convert_response(
        &self,
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> Result<LlmResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let message = LlmMessage::assistant(choice.message.content.unwrap_or_default());

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let finish_reason = choice.finish_reason.map(|reason| match reason {
            async_openai::types::FinishReason::Stop => FinishReason::Stop,
            async_openai::types::FinishReason::Length => FinishReason::Length,
            async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
            async_openai::types::FinishReason::ToolCalls => {
                FinishReason::Other("tool_calls".to_string())
            }
            async_openai::types::FinishReason::FunctionCall => {
                FinishReason::Other("function_call".to_string())
            }
        });

        if finish_reason == Some(FinishReason::Length) {
            tracing::debug!("OpenAI response truncated at max_tokens");
        }

        Ok(LlmResponse {
            message,
            usage,
            model: response.model,
            finish_reason,
        })
    }
}
