//! Query routing: classification, tool planning and answer assembly

pub mod base;
pub mod classifier;
pub mod config;
pub mod core;
pub mod execution;
pub mod planner;
pub mod prompt;

pub use base::{Agent, AgentResult};
pub use classifier::{parse_intent, Intent, IntentClassifier};
pub use config::{AgentBuilder, AgentConfig};
pub use core::QueryAgent;
pub use execution::{AgentAnswer, Route};
pub use planner::{parse_invocation, RawInvocation, ToolPlanner};
pub use prompt::SYSTEM_PROMPT;
