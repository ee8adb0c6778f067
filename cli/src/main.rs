//! # toolroute CLI
//!
//! Command-line interface for toolroute - ask a question and have it routed
//! to a tool server, web search or the language model.
//!
//! ## Usage
//!
//! - `toolroute` - Start interactive mode
//! - `toolroute "question"` - Answer a single question
//! - `toolroute tools` - Show the configured tool servers and their operations

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{ask_command, interactive_command, tools_command};
use config::CliConfigLoader;

/// Web search provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SearchChoice {
    Serper,
    Duckduckgo,
    Off,
}

impl SearchChoice {
    fn as_str(&self) -> &'static str {
        match self {
            SearchChoice::Serper => "serper",
            SearchChoice::Duckduckgo => "duckduckgo",
            SearchChoice::Off => "off",
        }
    }
}

/// toolroute - Route questions to MCP tools, web search or an LLM
#[derive(Parser)]
#[command(name = "toolroute")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Route questions to MCP tool servers, web search or an LLM")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol to use (openai_compat, anthropic)
    #[arg(long)]
    protocol: Option<String>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Web search provider
    #[arg(long, value_enum)]
    search: Option<SearchChoice>,

    /// Enable verbose logging and routing details
    #[arg(short, long)]
    verbose: bool,

    /// The question to answer (if provided, runs in single-question mode)
    question: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configured tool servers and their operations
    Tools,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(search) = cli.search {
        loader = loader.with_search_override(search.as_str().to_string());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean
    toolroute_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);

    match (cli.question, cli.command) {
        (Some(question), None) => ask_command(question, config_loader, cli.verbose).await,
        (Some(_), Some(_)) => {
            tracing::error!("Error: Cannot specify both a question and a subcommand");
            std::process::exit(1);
        }
        (None, Some(Commands::Tools)) => tools_command(config_loader).await,
        (None, None) => interactive_command(config_loader, cli.verbose).await,
    }
}
