//! Agent configuration structures

use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::llm::{create_llm_client, ChatOptions, LlmClient};
use crate::search::{create_search_client, SearchClient};
use crate::tools::{StdioConnector, ToolConnector, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::core::QueryAgent;

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Custom system prompt for every model call (optional)
    /// If not provided, the default system prompt will be used
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Route `general` and unrecognised queries through web search when a
    /// search client is configured
    #[serde(default = "default_search_general")]
    pub search_general: bool,

    /// Sampling options; defaults to the LLM's configured model params
    #[serde(default)]
    pub chat_options: Option<ChatOptions>,
}

fn default_search_general() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            search_general: default_search_general(),
            chat_options: None,
        }
    }
}

/// Builder for creating agents from the shared router configuration
pub struct AgentBuilder {
    router_config: Arc<RouterConfig>,
    agent_config: AgentConfig,
    llm_client: Option<Arc<dyn LlmClient>>,
    connector: Option<Arc<dyn ToolConnector>>,
    search_client: Option<Option<Arc<dyn SearchClient>>>,
}

impl AgentBuilder {
    /// Create a new agent builder
    pub fn new(router_config: Arc<RouterConfig>) -> Self {
        Self {
            router_config,
            agent_config: AgentConfig::default(),
            llm_client: None,
            connector: None,
            search_client: None,
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.agent_config.system_prompt = system_prompt;
        self
    }

    /// Choose whether general queries go through web search
    pub fn with_search_general(mut self, search_general: bool) -> Self {
        self.agent_config.search_general = search_general;
        self
    }

    /// Use this LLM client instead of one built from the config
    pub fn with_llm_client(mut self, llm_client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(llm_client);
        self
    }

    /// Use this connector instead of spawning stdio processes
    pub fn with_connector(mut self, connector: Arc<dyn ToolConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Use this search client instead of one built from the config
    pub fn with_search_client(mut self, search_client: Arc<dyn SearchClient>) -> Self {
        self.search_client = Some(Some(search_client));
        self
    }

    /// Disable web search regardless of the config
    pub fn without_search(mut self) -> Self {
        self.search_client = Some(None);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<QueryAgent> {
        self.router_config.validate()?;

        let llm = match self.llm_client {
            Some(llm) => llm,
            None => create_llm_client(&self.router_config.llm)?,
        };

        let connector: Arc<dyn ToolConnector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(StdioConnector::new()),
        };

        let search = match self.search_client {
            Some(search) => search,
            None => self
                .router_config
                .search
                .as_ref()
                .map(create_search_client)
                .transpose()?,
        };

        let options = self
            .agent_config
            .chat_options
            .clone()
            .unwrap_or_else(|| self.router_config.llm.params.clone().into());

        let registry = ToolRegistry::from_servers(self.router_config.tool_servers.clone());

        Ok(QueryAgent::new(
            self.agent_config,
            llm,
            connector,
            search,
            registry,
            options,
        ))
    }
}

impl TryFrom<Arc<RouterConfig>> for QueryAgent {
    type Error = Error;

    fn try_from(router_config: Arc<RouterConfig>) -> Result<Self> {
        AgentBuilder::new(router_config).build()
    }
}
