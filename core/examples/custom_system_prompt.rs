//! Example: answer one question with a custom system prompt
//!
//! Reads OPENROUTER_API_KEY (and SERPER_API_KEY if set) from the environment
//! and routes the question given on the command line.
//!
//! ```text
//! cargo run -p toolroute-core --example custom_system_prompt -- "What is the capital of France?"
//! ```

use std::sync::Arc;
use toolroute_core::{
    Agent, AgentBuilder, Protocol, ResolvedLlmConfig, RouterConfig, SearchConfig, SearchProvider,
    ToolServerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    toolroute_core::init_tracing();

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What is the capital of France?".to_string());

    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let llm = ResolvedLlmConfig::new(
        Protocol::OpenAICompat,
        "https://openrouter.ai/api/v1".to_string(),
        api_key,
        "openai/gpt-4o-mini".to_string(),
    );

    let mut config = RouterConfig::new(llm)
        .with_tool_server(
            "bmi",
            ToolServerConfig::new("bmi", "python", vec!["bmi-server.py".to_string()]),
        )
        .with_tool_server(
            "weather",
            ToolServerConfig::new("weather", "python", vec!["weather.py".to_string()]),
        );
    if let Ok(serper_key) = std::env::var("SERPER_API_KEY") {
        config = config.with_search(SearchConfig::new(SearchProvider::Serper).with_api_key(serper_key));
    }

    let agent = AgentBuilder::new(Arc::new(config))
        .with_system_prompt(Some(
            "You are a concise assistant. Answer in one short paragraph.".to_string(),
        ))
        .build()?;

    let answer = agent.answer(&question).await?;
    println!("{}", answer.answer);
    println!("(intent: {}, route: {})", answer.intent, answer.route);

    Ok(())
}
