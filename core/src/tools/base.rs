//! Base tool traits and structures

use crate::config::ToolServerConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::arguments::ValidatedArguments;

/// An operation exposed by a tool server, as reported by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Operation name
    pub name: String,

    /// Human readable description
    #[serde(default)]
    pub description: String,

    /// JSON schema for the operation's arguments
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: serde_json::Value,
}

fn empty_schema() -> serde_json::Value {
    serde_json::json!({"type": "object"})
}

impl ToolDescriptor {
    /// Create a new descriptor
    pub fn new<S: Into<String>>(name: S, description: S, input_schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A planned call: which operation to run and with what arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Name of the operation to call
    pub tool: String,

    /// Arguments, checked against the operation's input schema
    pub arguments: ValidatedArguments,
}

impl ToolInvocation {
    /// Create a new invocation
    pub fn new<S: Into<String>>(tool: S, arguments: ValidatedArguments) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

/// Text returned by a tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// First text content element of the result
    pub text: String,
}

impl ToolOutput {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}

/// A live connection to one tool server.
///
/// Sessions are short-lived: opened for a single query and closed right
/// after, whatever the outcome.
#[async_trait]
pub trait ToolSession: Send {
    /// List the operations the server exposes
    async fn list_operations(&mut self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke one operation
    async fn invoke(&mut self, invocation: &ToolInvocation) -> Result<ToolOutput>;

    /// Shut the session down and release the server process
    async fn close(&mut self);
}

/// Opens tool sessions
#[async_trait]
pub trait ToolConnector: Send + Sync {
    /// Start the server and complete the handshake
    async fn open(&self, server: &ToolServerConfig) -> Result<Box<dyn ToolSession>>;
}
