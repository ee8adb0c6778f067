//! LLM provider implementations

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use crate::llm::LlmClient;
use std::sync::Arc;

/// Create the LLM client matching the configured protocol
pub fn create_llm_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match &config.protocol {
        Protocol::OpenAICompat => Arc::new(OpenAiClient::new(config)?),
        Protocol::Anthropic => Arc::new(AnthropicClient::new(config)?),
        Protocol::Custom(name) => {
            return Err(LlmError::InvalidRequest {
                message: format!("Unsupported protocol: {}", name),
            }
            .into())
        }
    };

    tracing::debug!(
        "Created {} client for model {}",
        client.provider_name(),
        client.model_name()
    );

    Ok(client)
}
