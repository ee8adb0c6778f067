//! CLI configuration loader for toolroute
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./toolroute.json or ./.toolroute/config.json
//! 3. Git repository root: <repo_root>/.toolroute/config.json
//! 4. XDG config: <config dir>/toolroute/config.json
//! 5. Environment variables only (no files)

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use toolroute_core::{
    ModelParams, Protocol, ResolvedLlmConfig, RouterConfig, SearchConfig, SearchProvider,
    ToolServerConfig,
};
use tracing::debug;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
const APP_TITLE: &str = "toolroute";

/// Raw configuration file format (simple single-file schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// Protocol to use
    pub protocol: String,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name
    pub model: String,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Web search (optional, falls back to environment detection)
    #[serde(default)]
    pub search: Option<RawSearchConfig>,
    /// Tool servers keyed by intent label (optional, defaults to the python servers)
    #[serde(default)]
    pub tool_servers: HashMap<String, RawToolServer>,
}

/// Search section of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchConfig {
    /// `serper`, `duckduckgo` or `off`
    pub provider: String,
    /// API key (can be "env:VAR_NAME")
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Tool server entry of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawToolServer {
    /// Display name, defaults to the intent label
    #[serde(default)]
    pub name: Option<String>,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// CLI configuration loader
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    search_override: Option<String>,
    /// Snapshot of the environment
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
    xdg_config_dir: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader reading the process environment
    pub fn new() -> Self {
        Self {
            config_override: None,
            protocol_override: None,
            api_key_override: None,
            base_url_override: None,
            model_override: None,
            search_override: None,
            env: std::env::vars().collect(),
            working_dir: None,
            xdg_config_dir: dirs::config_dir(),
        }
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set protocol override
    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set search provider override (`serper`, `duckduckgo` or `off`)
    pub fn with_search_override(mut self, search: String) -> Self {
        self.search_override = Some(search);
        self
    }

    /// Replace the environment snapshot
    #[cfg(test)]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Search for config files from this directory instead of the current one
    #[cfg(test)]
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Set the XDG config directory, `None` disables it
    #[cfg(test)]
    pub fn with_xdg_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.xdg_config_dir = dir;
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<RouterConfig> {
        // Step 1: Find and load base configuration
        let mut config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load().await?
        };

        // Step 2: Apply flag overrides
        if let Some(protocol) = &self.protocol_override {
            config.protocol = protocol.clone();
        }
        if let Some(api_key) = &self.api_key_override {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = model.clone();
        }

        // Step 3: Resolve to final router config
        let resolved = self.resolve_config(config)?;
        resolved
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        Ok(resolved)
    }

    fn var(&self, name: &str) -> Option<String> {
        self.env.get(name).filter(|v| !v.is_empty()).cloned()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        match &self.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<RawConfig> {
        // 1. Current working directory
        if let Some(config) = self.try_load_cwd().await? {
            return Ok(config);
        }

        // 2. Git repository root
        if let Some(config) = self.try_load_git_root().await? {
            return Ok(config);
        }

        // 3. XDG config directory
        if let Some(config) = self.try_load_xdg().await? {
            return Ok(config);
        }

        // 4. Environment variables only
        self.try_load_env_only()
    }

    /// Try loading from current working directory
    async fn try_load_cwd(&self) -> Result<Option<RawConfig>> {
        let cwd = self.current_dir()?;

        let json = cwd.join("toolroute.json");
        if json.exists() {
            return Ok(Some(self.load_file(&json).await?));
        }

        let dir_config = cwd.join(".toolroute").join("config.json");
        if dir_config.exists() {
            return Ok(Some(self.load_file(&dir_config).await?));
        }

        Ok(None)
    }

    /// Try loading from git repository root
    async fn try_load_git_root(&self) -> Result<Option<RawConfig>> {
        if let Some(git_root) = self.find_git_root()? {
            let config_path = git_root.join(".toolroute").join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }
        Ok(None)
    }

    /// Try loading from XDG config directory
    async fn try_load_xdg(&self) -> Result<Option<RawConfig>> {
        if let Some(config_dir) = &self.xdg_config_dir {
            let config_path = config_dir.join("toolroute").join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }
        Ok(None)
    }

    /// Try loading from environment variables only
    fn try_load_env_only(&self) -> Result<RawConfig> {
        let openrouter_key = self.var("OPENROUTER_API_KEY");
        let openai_key = self.var("OPENAI_API_KEY");
        let anthropic_key = self.var("ANTHROPIC_API_KEY");

        let available_keys: Vec<_> = [
            openrouter_key.as_ref().map(|_| "openrouter"),
            openai_key.as_ref().map(|_| "openai"),
            anthropic_key.as_ref().map(|_| "anthropic"),
        ]
        .into_iter()
        .flatten()
        .collect();

        // An explicit protocol picks among the available keys
        let preference = self.protocol_override.as_deref();
        let provider = match preference {
            Some("anthropic") if anthropic_key.is_some() => "anthropic",
            Some("openai") | Some("openai_compat") if openai_key.is_some() => "openai",
            Some("openai") | Some("openai_compat") | Some("openrouter")
                if openrouter_key.is_some() =>
            {
                "openrouter"
            }
            Some(other) => {
                return Err(anyhow!(
                    "Protocol '{}' specified but no corresponding API key found. Available keys: {}",
                    other,
                    available_keys.join(", ")
                ))
            }
            None => available_keys.first().copied().ok_or_else(|| {
                anyhow!(
                    "No configuration found. Please create a toolroute.json file or set OPENROUTER_API_KEY"
                )
            })?,
        };

        let (protocol, api_key, base_url, default_model, headers) = match provider {
            "openrouter" => (
                "openai_compat",
                openrouter_key,
                Some(OPENROUTER_BASE_URL.to_string()),
                OPENROUTER_MODEL,
                HashMap::from([
                    ("HTTP-Referer".to_string(), APP_TITLE.to_string()),
                    ("X-Title".to_string(), APP_TITLE.to_string()),
                ]),
            ),
            "openai" => ("openai_compat", openai_key, None, OPENAI_MODEL, HashMap::new()),
            _ => ("anthropic", anthropic_key, None, ANTHROPIC_MODEL, HashMap::new()),
        };
        let api_key = api_key.ok_or_else(|| anyhow!("API key for {} disappeared", provider))?;

        debug!("Using {} credentials from the environment", provider);

        Ok(RawConfig {
            protocol: protocol.to_string(),
            api_key,
            base_url: self.var("TOOLROUTE_BASE_URL").or(base_url),
            model: self
                .var("TOOLROUTE_MODEL")
                .unwrap_or_else(|| default_model.to_string()),
            params: ModelParams::default(),
            headers,
            search: None,
            tool_servers: HashMap::new(),
        })
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        debug!("Loading config file {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find git repository root
    fn find_git_root(&self) -> Result<Option<PathBuf>> {
        let mut current = self.current_dir()?;

        loop {
            if current.join(".git").exists() {
                return Ok(Some(current));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve `env:NAME` references
    fn resolve_secret(&self, value: &str) -> Result<String> {
        match value.strip_prefix("env:") {
            Some(var_name) => self
                .var(var_name)
                .ok_or_else(|| anyhow!("Environment variable not found: {}", var_name)),
            None => Ok(value.to_string()),
        }
    }

    /// Resolve raw config to RouterConfig
    fn resolve_config(&self, config: RawConfig) -> Result<RouterConfig> {
        let protocol = match config.protocol.as_str() {
            "openai" | "openai_compat" | "openrouter" => Protocol::OpenAICompat,
            "anthropic" => Protocol::Anthropic,
            custom => Protocol::Custom(custom.to_string()),
        };

        let api_key = self.resolve_secret(&config.api_key)?;

        let base_url = match config.base_url {
            Some(base_url) => base_url,
            None => protocol
                .default_base_url()
                .ok_or_else(|| anyhow!("Protocol '{}' requires a base_url", protocol.as_str()))?
                .to_string(),
        };

        let llm = ResolvedLlmConfig::new(protocol, base_url, api_key, config.model)
            .with_params(config.params)
            .with_headers(config.headers);

        let search = self.resolve_search(config.search)?;
        let tool_servers = self.resolve_tool_servers(config.tool_servers);

        let mut router = RouterConfig::new(llm);
        router.search = search;
        router.tool_servers = tool_servers;
        Ok(router)
    }

    /// Pick the search provider: flag, then file, then environment
    fn resolve_search(&self, raw: Option<RawSearchConfig>) -> Result<Option<SearchConfig>> {
        let env_choice = self.var("TOOLROUTE_SEARCH");
        let choice = self
            .search_override
            .clone()
            .or_else(|| raw.as_ref().map(|r| r.provider.clone()))
            .or(env_choice);

        let choice = match choice {
            Some(choice) => choice.to_lowercase(),
            None if self.var("SERPER_API_KEY").is_some() => "serper".to_string(),
            None => return Ok(None),
        };
        if choice == "off" || choice == "none" {
            return Ok(None);
        }

        let provider: SearchProvider = choice.parse().map_err(|e: String| anyhow!(e))?;
        let mut search = SearchConfig::new(provider);

        if let Some(raw) = raw.filter(|r| r.provider.eq_ignore_ascii_case(provider.as_str())) {
            if let Some(api_key) = &raw.api_key {
                search.api_key = Some(self.resolve_secret(api_key)?);
            }
            search.endpoint = raw.endpoint;
            if let Some(max_results) = raw.max_results {
                search.max_results = max_results;
            }
            if let Some(timeout) = raw.timeout_seconds {
                search.timeout_seconds = timeout;
            }
        }

        if provider == SearchProvider::Serper && search.api_key.is_none() {
            search.api_key = self.var("SERPER_API_KEY");
        }

        Ok(Some(search))
    }

    fn resolve_tool_servers(
        &self,
        raw: HashMap<String, RawToolServer>,
    ) -> HashMap<String, ToolServerConfig> {
        if raw.is_empty() {
            return default_tool_servers();
        }

        raw.into_iter()
            .map(|(intent, server)| {
                let mut config = ToolServerConfig::new(
                    server.name.unwrap_or_else(|| intent.clone()),
                    server.command,
                    server.args,
                );
                config.env = server.env;
                if let Some(timeout) = server.timeout_seconds {
                    config.timeout_seconds = timeout;
                }
                (intent, config)
            })
            .collect()
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// The BMI and weather servers, started with python from the working directory
fn default_tool_servers() -> HashMap<String, ToolServerConfig> {
    HashMap::from([
        (
            "bmi".to_string(),
            ToolServerConfig::new("bmi", "python", vec!["bmi-server.py".to_string()]),
        ),
        (
            "weather".to_string(),
            ToolServerConfig::new("weather", "python", vec!["weather.py".to_string()]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn loader(dir: &TempDir, vars: &[(&str, &str)]) -> CliConfigLoader {
        CliConfigLoader::new()
            .with_env(env(vars))
            .with_working_dir(dir.path().to_path_buf())
            .with_xdg_config_dir(None)
    }

    #[tokio::test]
    async fn test_env_only_openrouter_defaults() {
        let dir = TempDir::new().unwrap();
        let config = loader(&dir, &[("OPENROUTER_API_KEY", "sk-or-test")])
            .load()
            .await
            .unwrap();

        assert_eq!(config.llm.protocol, Protocol::OpenAICompat);
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.headers.get("X-Title").map(String::as_str), Some("toolroute"));
        assert_eq!(config.llm.params.max_tokens, Some(250));
        assert!(config.search.is_none());
        assert_eq!(config.tool_servers["bmi"].command_line(), "python bmi-server.py");
        assert_eq!(config.tool_servers["weather"].command_line(), "python weather.py");
    }

    #[tokio::test]
    async fn test_env_only_without_keys_fails() {
        let dir = TempDir::new().unwrap();
        let err = loader(&dir, &[]).load().await.unwrap_err();
        assert!(err.to_string().contains("No configuration found"));
    }

    #[tokio::test]
    async fn test_env_search_detection() {
        let dir = TempDir::new().unwrap();
        let config = loader(
            &dir,
            &[("OPENROUTER_API_KEY", "k"), ("SERPER_API_KEY", "serper-key")],
        )
        .load()
        .await
        .unwrap();
        let search = config.search.unwrap();
        assert_eq!(search.provider, SearchProvider::Serper);
        assert_eq!(search.api_key.as_deref(), Some("serper-key"));

        let config = loader(
            &dir,
            &[("OPENROUTER_API_KEY", "k"), ("TOOLROUTE_SEARCH", "duckduckgo")],
        )
        .load()
        .await
        .unwrap();
        assert_eq!(config.search.unwrap().provider, SearchProvider::DuckDuckGo);
    }

    #[tokio::test]
    async fn test_config_file_in_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("toolroute.json"),
            r#"{
                "protocol": "anthropic",
                "api_key": "env:MY_KEY",
                "model": "claude-3-5-haiku-20241022",
                "search": {"provider": "duckduckgo", "timeout_seconds": 5},
                "tool_servers": {
                    "bmi": {"command": "uv", "args": ["run", "bmi-server.py"]}
                }
            }"#,
        )
        .unwrap();

        let config = loader(&dir, &[("MY_KEY", "secret")]).load().await.unwrap();

        assert_eq!(config.llm.protocol, Protocol::Anthropic);
        assert_eq!(config.llm.api_key, "secret");
        assert_eq!(config.llm.base_url, "https://api.anthropic.com");
        let search = config.search.unwrap();
        assert_eq!(search.provider, SearchProvider::DuckDuckGo);
        assert_eq!(search.timeout_seconds, 5);
        assert_eq!(config.tool_servers.len(), 1);
        assert_eq!(config.tool_servers["bmi"].name, "bmi");
        assert_eq!(config.tool_servers["bmi"].command_line(), "uv run bmi-server.py");
    }

    #[tokio::test]
    async fn test_dot_dir_config_and_flag_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".toolroute")).unwrap();
        std::fs::write(
            dir.path().join(".toolroute").join("config.json"),
            r#"{"protocol": "openai_compat", "api_key": "file-key", "model": "gpt-4o-mini",
                "search": {"provider": "serper", "api_key": "serper-file-key"}}"#,
        )
        .unwrap();

        let config = loader(&dir, &[])
            .with_model_override("openai/gpt-4o".to_string())
            .with_base_url_override("https://openrouter.ai/api/v1".to_string())
            .with_search_override("off".to_string())
            .load()
            .await
            .unwrap();

        assert_eq!(config.llm.api_key, "file-key");
        assert_eq!(config.llm.model, "openai/gpt-4o");
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
        assert!(config.search.is_none());
    }

    #[tokio::test]
    async fn test_config_override_directory() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        std::fs::write(
            other.path().join("config.json"),
            r#"{"protocol": "openai", "api_key": "k", "model": "m"}"#,
        )
        .unwrap();

        let config = loader(&dir, &[])
            .with_config_override(other.path().to_path_buf())
            .load()
            .await
            .unwrap();
        assert_eq!(config.llm.model, "m");

        let err = loader(&dir, &[])
            .with_config_override(dir.path().join("missing.json"))
            .load()
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("does not exist"));
    }

    #[tokio::test]
    async fn test_serper_without_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = loader(&dir, &[("OPENROUTER_API_KEY", "k")])
            .with_search_override("serper".to_string())
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[tokio::test]
    async fn test_missing_env_reference() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("toolroute.json"),
            r#"{"protocol": "openai", "api_key": "env:NOT_SET", "model": "m"}"#,
        )
        .unwrap();
        let err = loader(&dir, &[]).load().await.unwrap_err();
        assert!(err.to_string().contains("NOT_SET"));
    }
}
