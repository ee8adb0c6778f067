//! CLI command implementations

pub mod ask;
pub mod interactive;
pub mod tools;

pub use ask::ask_command;
pub use interactive::interactive_command;
pub use tools::tools_command;

use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use toolroute_core::{AgentAnswer, AgentBuilder, QueryAgent};
use tracing::{debug, info};

/// Load the configuration and build the agent shared by every command
pub(crate) async fn build_agent(config_loader: &CliConfigLoader) -> Result<QueryAgent> {
    let router_config = config_loader.load().await?;
    info!("Using protocol: {}", router_config.llm.protocol.as_str());
    info!("Using model: {}", router_config.llm.model);
    if let Some(search) = &router_config.search {
        info!("Web search: {}", search.provider);
    }

    let agent = AgentBuilder::new(Arc::new(router_config))
        .build()
        .context("Failed to initialise the query router")?;
    debug!(
        search = agent.has_search(),
        tool_servers = ?agent.registry().intents(),
        "Query router ready"
    );
    Ok(agent)
}

/// Print an answer to stdout, with routing details on stderr when verbose
pub(crate) fn print_answer(answer: &AgentAnswer, verbose: bool) {
    println!("{}", answer.answer);

    if verbose {
        let mut details = format!(
            "intent: {}, route: {}, {} ms",
            answer.intent, answer.route, answer.duration_ms
        );
        if let Some(reason) = &answer.fallback_reason {
            details.push_str(&format!(", fallback: {}", reason));
        }
        eprintln!("{}", details.dimmed());
    }
}
