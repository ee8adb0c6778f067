//! Tools listing command

use crate::config::CliConfigLoader;
use anyhow::Result;
use colored::Colorize;
use toolroute_core::tools::ToolOutputFormatter;
use tracing::info;

/// Start every configured tool server and list its operations
pub async fn tools_command(config_loader: CliConfigLoader) -> Result<()> {
    info!("Listing available tools");

    let agent = crate::commands::build_agent(&config_loader).await?;
    let formatter = ToolOutputFormatter::new();

    println!("{}\n", "Available Tools".bold());

    for (intent, server) in agent.registry().servers() {
        println!("{} {} ({})", "•".cyan(), intent.bold(), server.command_line().dimmed());

        match agent.list_operations(intent).await {
            Ok(operations) if operations.is_empty() => println!("   {}", "no operations".dimmed()),
            Ok(operations) => {
                for operation in &operations {
                    println!("   {}", formatter.format_operation(operation));
                }
            }
            Err(e) => println!("   {} {}", "unavailable:".red(), e),
        }
        println!();
    }

    Ok(())
}
