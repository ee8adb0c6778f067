//! # toolroute Core
//!
//! Core library for toolroute, a query router that answers questions with
//! external MCP tool servers, web search or the language model directly.
//!
//! A query is classified into an [`Intent`]; BMI and weather queries are
//! planned and executed against a tool server, everything else goes through
//! web search (when configured) and finally a direct model answer.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod search;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use agent::{Agent, AgentAnswer, AgentBuilder, AgentConfig, Intent, QueryAgent, Route};
pub use config::{
    ModelParams, Protocol, ResolvedLlmConfig, RouterConfig, SearchConfig, SearchProvider,
    ToolServerConfig,
};
pub use error::{Error, Result};
pub use search::{SearchClient, SearchOutcome};
pub use tools::{StdioConnector, ToolConnector, ToolDescriptor, ToolRegistry};

/// Current version of the toolroute-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
