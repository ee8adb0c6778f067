//! Configuration for the external services the router talks to

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported web search providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    /// google.serper.dev, requires an API key
    Serper,
    /// DuckDuckGo Instant Answer API, keyless
    DuckDuckGo,
}

impl SearchProvider {
    /// Get the provider name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchProvider::Serper => "serper",
            SearchProvider::DuckDuckGo => "duckduckgo",
        }
    }

    /// Get the default endpoint for this provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            SearchProvider::Serper => "https://google.serper.dev/search",
            SearchProvider::DuckDuckGo => "https://api.duckduckgo.com/",
        }
    }
}

impl std::fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "serper" => Ok(SearchProvider::Serper),
            "duckduckgo" | "ddg" => Ok(SearchProvider::DuckDuckGo),
            other => Err(format!("Unknown search provider: {}", other)),
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Which provider to query
    pub provider: SearchProvider,
    /// API key, required by Serper
    #[serde(default)]
    pub api_key: Option<String>,
    /// Endpoint override, defaults to the provider's public endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Number of organic results kept in the formatted blob
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,
}

fn default_max_results() -> usize {
    3
}

fn default_search_timeout() -> u64 {
    10
}

impl SearchConfig {
    /// Create a configuration for the given provider with default limits
    pub fn new(provider: SearchProvider) -> Self {
        Self {
            provider,
            api_key: None,
            endpoint: None,
            max_results: default_max_results(),
            timeout_seconds: default_search_timeout(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.provider == SearchProvider::Serper
            && self.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err("Serper search requires an API key".to_string());
        }

        if self.max_results == 0 {
            return Err("Search max_results must be at least 1".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("Search timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}

/// An external tool process reachable over MCP stdio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolServerConfig {
    /// Server name, used in logs and errors
    pub name: String,
    /// Executable to spawn
    pub command: String,
    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the process
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_tool_timeout")]
    pub timeout_seconds: u64,
}

fn default_tool_timeout() -> u64 {
    30
}

impl ToolServerConfig {
    /// Create a server configuration
    pub fn new<S: Into<String>>(name: S, command: S, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            env: HashMap::new(),
            timeout_seconds: default_tool_timeout(),
        }
    }

    /// Human readable command line
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.command.trim().is_empty() {
            return Err(format!("Tool server '{}' has an empty command", self.name));
        }

        if self.timeout_seconds == 0 {
            return Err(format!(
                "Tool server '{}' timeout must be greater than zero",
                self.name
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serper_requires_api_key() {
        let config = SearchConfig::new(SearchProvider::Serper);
        assert!(config.validate().is_err());

        let config = config.with_api_key("key".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(), "https://google.serper.dev/search");
    }

    #[test]
    fn test_duckduckgo_needs_no_key() {
        let config = SearchConfig::new(SearchProvider::DuckDuckGo);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_results, 3);
    }

    #[test]
    fn test_search_config_defaults_from_json() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"provider": "serper", "api_key": "abc"}"#).unwrap();
        assert_eq!(config.provider, SearchProvider::Serper);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.max_results, 3);
    }

    #[test]
    fn test_tool_server_command_line() {
        let server = ToolServerConfig::new("bmi", "python", vec!["bmi-server.py".to_string()]);
        assert_eq!(server.command_line(), "python bmi-server.py");
        assert!(server.validate().is_ok());

        let empty = ToolServerConfig::new("broken", " ", Vec::new());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_search_provider_from_str() {
        assert_eq!("DDG".parse::<SearchProvider>(), Ok(SearchProvider::DuckDuckGo));
        assert!("bing".parse::<SearchProvider>().is_err());
    }
}
