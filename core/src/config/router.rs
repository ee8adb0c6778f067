//! Process-wide router configuration

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ResolvedLlmConfig, SearchConfig, ToolServerConfig};

/// Everything the router needs, resolved once at startup and shared
/// read-only between queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Language model used for classification, planning and answering
    pub llm: ResolvedLlmConfig,

    /// Web search fallback; `None` disables the search branch
    #[serde(default)]
    pub search: Option<SearchConfig>,

    /// Tool servers keyed by intent label (`bmi`, `weather`)
    #[serde(default)]
    pub tool_servers: HashMap<String, ToolServerConfig>,
}

impl RouterConfig {
    /// Create a configuration with no search and no tool servers
    pub fn new(llm: ResolvedLlmConfig) -> Self {
        Self {
            llm,
            search: None,
            tool_servers: HashMap::new(),
        }
    }

    /// Enable web search
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = Some(search);
        self
    }

    /// Register a tool server for an intent label
    pub fn with_tool_server<S: Into<String>>(mut self, intent: S, server: ToolServerConfig) -> Self {
        self.tool_servers.insert(intent.into(), server);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.llm.validate().map_err(|e| ConfigError::InvalidValue {
            field: "llm".to_string(),
            value: e,
        })?;

        if let Some(search) = &self.search {
            search.validate().map_err(|e| ConfigError::InvalidValue {
                field: "search".to_string(),
                value: e,
            })?;
        }

        for (intent, server) in &self.tool_servers {
            server.validate().map_err(|e| ConfigError::InvalidValue {
                field: format!("tool_servers.{}", intent),
                value: e,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Protocol, SearchProvider};

    fn llm() -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            Protocol::OpenAICompat,
            "https://openrouter.ai/api/v1".to_string(),
            "sk-test".to_string(),
            "openai/gpt-4o-mini".to_string(),
        )
    }

    #[test]
    fn test_validate_reports_failing_tool_server() {
        let config = RouterConfig::new(llm())
            .with_tool_server("bmi", ToolServerConfig::new("bmi", "", Vec::new()));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tool_servers.bmi"), "{}", err);
    }

    #[test]
    fn test_validate_reports_failing_search() {
        let config = RouterConfig::new(llm()).with_search(SearchConfig::new(SearchProvider::Serper));
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("search"), "{}", err);
    }

    #[test]
    fn test_roundtrip_through_json_keeps_servers() {
        let config = RouterConfig::new(llm()).with_tool_server(
            "weather",
            ToolServerConfig::new("weather", "python", vec!["weather.py".to_string()]),
        );
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RouterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tool_servers["weather"].command, "python");
        assert!(parsed.search.is_none());
        assert!(parsed.validate().is_ok());
    }
}
