//! Tool registry for mapping intents to tool servers

use crate::config::ToolServerConfig;
use crate::error::{Result, ToolError};
use std::collections::HashMap;

/// Registry of tool servers keyed by the intent label that routes to them
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    servers: HashMap<String, ToolServerConfig>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured servers
    pub fn from_servers(servers: HashMap<String, ToolServerConfig>) -> Self {
        Self { servers }
    }

    /// Register a server for an intent label, replacing any previous one
    pub fn register<S: Into<String>>(&mut self, intent: S, server: ToolServerConfig) {
        self.servers.insert(intent.into(), server);
    }

    /// Look up the server for an intent label
    pub fn server_for(&self, intent: &str) -> Result<&ToolServerConfig> {
        self.servers.get(intent).ok_or_else(|| {
            ToolError::Unavailable {
                server: intent.to_string(),
                message: "no tool server configured".to_string(),
            }
            .into()
        })
    }

    /// Registered intent labels, sorted
    pub fn intents(&self) -> Vec<&str> {
        let mut intents: Vec<&str> = self.servers.keys().map(|s| s.as_str()).collect();
        intents.sort_unstable();
        intents
    }

    /// Registered servers in label order
    pub fn servers(&self) -> Vec<(&str, &ToolServerConfig)> {
        self.intents()
            .into_iter()
            .filter_map(|intent| self.servers.get(intent).map(|server| (intent, server)))
            .collect()
    }
}
