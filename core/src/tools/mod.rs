//! Tool registry client: MCP sessions, argument validation and answer formatting

pub mod arguments;
pub mod base;
pub mod mcp;
pub mod output_formatter;
pub mod registry;

pub use arguments::{validate_arguments, ArgumentValue, ValidatedArguments};
pub use base::{ToolConnector, ToolDescriptor, ToolInvocation, ToolOutput, ToolSession};
pub use mcp::{McpSession, StdioConnector, StdioSession};
pub use output_formatter::{OutputKind, ToolOutputFormatter};
pub use registry::ToolRegistry;
