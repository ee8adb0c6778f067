//! Base agent trait

use super::config::AgentConfig;
use super::execution::AgentAnswer;
use crate::error::Result;
use async_trait::async_trait;

/// Result type for agent operations
pub type AgentResult<T> = Result<T>;

/// Anything that turns a question into an answer
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer one query.
    ///
    /// Fails only when the language model cannot be reached for the final
    /// direct answer; every other failure degrades to a fallback answer.
    async fn answer(&self, query: &str) -> AgentResult<AgentAnswer>;

    /// Get the agent's configuration
    fn config(&self) -> &AgentConfig;

    /// Get the agent's name/type
    fn agent_type(&self) -> &str;
}
