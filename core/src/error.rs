//! Error types and handling for toolroute core

use thiserror::Error;

/// Result type alias for toolroute operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for toolroute core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool process and invocation errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Structured invocation planning errors
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Tool argument validation errors
    #[error("Argument validation error: {0}")]
    Arguments(#[from] ArgumentError),

    /// Web search errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

impl Error {
    /// Whether this error means the language model itself could not be reached
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Error::Llm(_))
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Tool process and invocation errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool server '{server}' is unavailable: {message}")]
    Unavailable { server: String, message: String },

    #[error("Tool invocation failed: {name} - {message}")]
    InvocationFailed { name: String, message: String },

    #[error("Tool '{name}' returned no text content")]
    EmptyContent { name: String },

    #[error("Tool protocol error: {message}")]
    Protocol { message: String },

    #[error("Tool timeout: {name}")]
    Timeout { name: String },
}

/// Errors produced while turning a model reply into a tool invocation
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Model did not return a valid tool call ({message}): {reply}")]
    Parse { reply: String, message: String },

    #[error("Model selected an unknown operation: {name}")]
    UnknownOperation { name: String },
}

/// Errors produced while checking tool arguments against an input schema
#[derive(Error, Debug, PartialEq)]
pub enum ArgumentError {
    #[error("Arguments must be a JSON object, got {found}")]
    NotAnObject { found: String },

    #[error("Missing required argument: {name}")]
    MissingRequired { name: String },

    #[error("Argument '{name}' should be {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Unexpected argument: {name}")]
    Unexpected { name: String },
}

/// Web search transport errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {message}")]
    Transport { message: String },

    #[error("Search provider returned status {status}")]
    Status { status: u16 },

    #[error("Malformed search response: {message}")]
    Payload { message: String },

    #[error("No API key configured for {provider}")]
    MissingApiKey { provider: String },
}
