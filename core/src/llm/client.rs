//! LLM client trait and response structures

use crate::config::ModelParams;
use crate::error::{LlmError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::LlmMessage;

/// Trait for LLM clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Single-turn completion: one system prompt, one user prompt, text back.
    ///
    /// The reply is trimmed; a blank reply is an [`LlmError::EmptyResponse`].
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: Option<ChatOptions>,
    ) -> Result<String> {
        let messages = vec![LlmMessage::system(system_prompt), LlmMessage::user(user_prompt)];
        let response = self.chat_completion(messages, options).await?;

        response
            .message
            .get_text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::EmptyResponse.into())
    }
}

/// Response from an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated message
    pub message: LlmMessage,

    /// Usage statistics
    pub usage: Option<Usage>,

    /// Model used for generation
    pub model: String,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

/// Usage statistics for a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,

    /// Number of tokens in the completion
    pub completion_tokens: u32,

    /// Total number of tokens
    pub total_tokens: u32,
}

/// Reason why generation finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Generation completed naturally
    Stop,

    /// Hit the maximum token limit
    Length,

    /// Content was filtered
    ContentFilter,

    /// Other reason
    Other(String),
}

/// Options for chat completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Temperature for generation
    pub temperature: Option<f32>,

    /// Top-p sampling parameter
    pub top_p: Option<f32>,

    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        ModelParams::default().into()
    }
}

impl From<ModelParams> for ChatOptions {
    fn from(params: ModelParams) -> Self {
        Self {
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stop: params.stop_sequences,
        }
    }
}
