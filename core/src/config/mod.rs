//! Configuration module for toolroute core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod router;
pub mod services;
pub mod types;

pub use router::RouterConfig;
pub use services::{SearchConfig, SearchProvider, ToolServerConfig};
pub use types::{ModelParams, Protocol, ResolvedLlmConfig};
