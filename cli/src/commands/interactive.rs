//! Interactive mode command

use crate::commands::{build_agent, print_answer};
use crate::config::CliConfigLoader;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use toolroute_core::Agent;
use tracing::debug;

/// Read questions from stdin until EOF, `exit` or `quit`
pub async fn interactive_command(config_loader: CliConfigLoader, verbose: bool) -> Result<()> {
    let agent = build_agent(&config_loader).await?;

    eprintln!(
        "{} {}",
        "toolroute".bold(),
        "ask about BMI, the weather or anything else (exit to quit)".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", ">".cyan().bold());
        std::io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        debug!("Question: {}", question);
        match agent.answer(question).await {
            Ok(answer) => print_answer(&answer, verbose),
            Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
        }
    }

    Ok(())
}
