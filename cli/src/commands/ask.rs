//! Single question command

use crate::commands::{build_agent, print_answer};
use crate::config::CliConfigLoader;
use anyhow::Result;
use toolroute_core::Agent;
use tracing::debug;

/// Answer one question and print it
pub async fn ask_command(question: String, config_loader: CliConfigLoader, verbose: bool) -> Result<()> {
    let agent = build_agent(&config_loader).await?;

    debug!("Question: {}", question);
    let answer = agent.answer(&question).await?;
    print_answer(&answer, verbose);

    Ok(())
}
