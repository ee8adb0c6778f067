//! Prompt templates for every model call the router makes

use crate::tools::ToolDescriptor;

/// System prompt shared by all model calls
pub const SYSTEM_PROMPT: &str = "You are an intelligent assistant. You will execute tasks as prompted";

/// Ask the model to label the query with one intent
pub fn build_classification_prompt(query: &str) -> String {
    format!(
        "Analyze this query and determine if it's related to BMI calculations, weather information, \
         web search, or general knowledge. Respond with only 'bmi', 'weather', 'search', or 'general' \
         based on the query's intent: \"{}\"",
        query
    )
}

/// Ask the model to pick one operation and fill in its arguments
pub fn build_tool_selection_prompt(query: &str, tools: &[ToolDescriptor]) -> String {
    let tools_description = tools
        .iter()
        .map(|tool| format!("- {}, {}, {} ", tool.name, tool.description, tool.input_schema))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an intelligent assistant that analyzes user queries to determine the most appropriate tool to use. \n\n\
         Available tools:\n\
         {}\n\n\
         Instructions:\n\
         1. Analyze the semantic meaning and intent of the user's query\n\
         2. Consider the purpose and capabilities of each available tool\n\
         3. Select the most appropriate tool based on the query's intent, not just keywords\n\
         4. Extract or infer the necessary arguments from the query\n\n\
         User's Query: {}\n\n\
         Response format (JSON only):\n\
         {{\n    \"tool\": \"selected-tool-name\",\n    \"arguments\": {{\n        \"parameter\": \"value\"\n    }}\n}}\n",
        tools_description, query
    )
}

/// Ask the model to answer from search results
pub fn build_synthesis_prompt(query: &str, search_results: &str) -> String {
    format!(
        "Based on these search results, please answer the question: \"{}\"\n\n\
         Search results:\n\
         {}\n\n\
         Provide a concise answer based on the information in these search results.",
        query, search_results
    )
}

/// Ask the model to answer on its own
pub fn build_direct_prompt(query: &str) -> String {
    format!("Please answer this question: {}", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification_prompt_quotes_query() {
        let prompt = build_classification_prompt("Is it raining in Paris?");
        assert!(prompt.ends_with("based on the query's intent: \"Is it raining in Paris?\""));
        assert!(prompt.contains("'bmi', 'weather', 'search', or 'general'"));
    }

    #[test]
    fn test_tool_selection_prompt_lists_tools() {
        let tools = vec![
            ToolDescriptor::new("get_alerts", "Get weather alerts", json!({"type": "object"})),
            ToolDescriptor::new("get_forecast", "Get a forecast", json!({"type": "object"})),
        ];
        let prompt = build_tool_selection_prompt("Forecast for NY?", &tools);

        assert!(prompt.contains("Available tools:\n- get_alerts, Get weather alerts, {\"type\":\"object\"} \n- get_forecast"));
        assert!(prompt.contains("User's Query: Forecast for NY?"));
        assert!(prompt.contains("\"tool\": \"selected-tool-name\""));
        assert!(prompt.ends_with("}\n"));
    }

    #[test]
    fn test_synthesis_and_direct_prompts() {
        let prompt = build_synthesis_prompt("Capital of France?", "1. Paris: capital");
        assert!(prompt.starts_with("Based on these search results, please answer the question: \"Capital of France?\""));
        assert!(prompt.contains("Search results:\n1. Paris: capital\n\n"));

        assert_eq!(
            build_direct_prompt("Capital of France?"),
            "Please answer this question: Capital of France?"
        );
    }
}
