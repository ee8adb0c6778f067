//! LLM configuration types
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported LLM protocols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// OpenAI-compatible API (includes OpenAI, OpenRouter, local models)
    #[serde(rename = "openai_compat")]
    OpenAICompat,
    /// Anthropic Claude API
    #[serde(rename = "anthropic")]
    Anthropic,
    /// Custom protocol
    #[serde(rename = "custom")]
    Custom(String),
}

impl Protocol {
    /// Get the protocol name as a string
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::OpenAICompat => "openai_compat",
            Protocol::Anthropic => "anthropic",
            Protocol::Custom(name) => name,
        }
    }

    /// Get the default base URL for this protocol
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Protocol::OpenAICompat => Some("https://api.openai.com/v1"),
            Protocol::Anthropic => Some("https://api.anthropic.com"),
            Protocol::Custom(_) => None,
        }
    }
}

/// Model parameters for LLM requests
///
/// Every call made by the router (classification, planning, synthesis and
/// direct answers) uses the same token limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            max_tokens: Some(250),
            temperature: Some(0.2),
            top_p: None,
            stop_sequences: None,
        }
    }
}

/// A fully resolved LLM configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// The protocol to use
    pub protocol: Protocol,
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers for requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(protocol: Protocol, base_url: String, api_key: String, model: String) -> Self {
        Self {
            protocol,
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
        }
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Add multiple headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API key cannot be empty".to_string());
        }

        if self.model.is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if self.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err("Top-p must be between 0.0 and 1.0".to_string());
            }
        }

        if self.params.max_tokens == Some(0) {
            return Err("Max tokens must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            Protocol::OpenAICompat,
            "https://openrouter.ai/api/v1".to_string(),
            "sk-test".to_string(),
            "openai/gpt-4o-mini".to_string(),
        )
    }

    #[test]
    fn test_default_params_use_routing_limits() {
        let params = ModelParams::default();
        assert_eq!(params.max_tokens, Some(250));
        assert_eq!(params.temperature, Some(0.2));
    }

    #[test]
    fn test_partial_params_keep_routing_defaults() {
        let params: ModelParams = serde_json::from_str(r#"{"max_tokens": 100}"#).unwrap();
        assert_eq!(params.max_tokens, Some(100));
        assert_eq!(params.temperature, Some(0.2));
        assert!(params.top_p.is_none());
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = config();
        cfg.api_key.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.base_url = "openrouter.ai".to_string();
        assert_eq!(
            cfg.validate().unwrap_err(),
            "Base URL must start with http:// or https://"
        );

        let mut cfg = config();
        cfg.params.temperature = Some(3.5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_protocol_deserializes_from_snake_case() {
        let protocol: Protocol = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(protocol, Protocol::Anthropic);
        assert_eq!(
            Protocol::OpenAICompat.default_base_url(),
            Some("https://api.openai.com/v1")
        );
    }
}
