//! Tool invocation planning
//!
//! The model is shown the operations a tool server lists and answers with a
//! JSON object naming one of them. That reply is parsed, the operation is
//! checked against the listing and the arguments against its input schema.

use crate::agent::prompt::build_tool_selection_prompt;
use crate::error::{PlanError, Result};
use crate::llm::{ChatOptions, LlmClient};
use crate::tools::{validate_arguments, ToolDescriptor, ToolInvocation};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};
use tracing::debug;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[a-zA-Z]*\s*(\{.*?\})\s*```").expect("code fence pattern is valid")
});

/// Operation name and arguments as the model wrote them
#[derive(Debug, Clone, PartialEq)]
pub struct RawInvocation {
    pub tool: String,
    pub arguments: Value,
}

/// Parse a model reply into a raw invocation.
///
/// Accepts a bare JSON object, one inside a Markdown code fence, or the
/// first balanced `{...}` embedded in prose.
pub fn parse_invocation(reply: &str) -> std::result::Result<RawInvocation, PlanError> {
    let trimmed = reply.trim();

    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(fenced) = CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        candidates.push(fenced.as_str());
    }
    if let Some(embedded) = first_balanced_object(trimmed) {
        candidates.push(embedded);
    }

    let object = candidates
        .into_iter()
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .ok_or_else(|| parse_error(reply, "no JSON object found"))?;

    let tool = object
        .get("tool")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| parse_error(reply, "missing string field 'tool'"))?
        .to_string();

    let arguments = match object.get("arguments") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args @ Value::Object(_)) => args.clone(),
        Some(_) => return Err(parse_error(reply, "'arguments' must be an object")),
    };

    Ok(RawInvocation { tool, arguments })
}

fn parse_error(reply: &str, message: &str) -> PlanError {
    PlanError::Parse {
        reply: reply.to_string(),
        message: message.to_string(),
    }
}

/// Slice of the first `{...}` whose braces balance, ignoring braces in strings
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Resolve a raw invocation against the listed operations
pub fn resolve_invocation(
    raw: RawInvocation,
    tools: &[ToolDescriptor],
) -> Result<ToolInvocation> {
    let descriptor = tools
        .iter()
        .find(|tool| tool.name == raw.tool)
        .ok_or_else(|| PlanError::UnknownOperation {
            name: raw.tool.clone(),
        })?;

    let arguments = validate_arguments(&descriptor.input_schema, &raw.arguments)?;
    Ok(ToolInvocation::new(raw.tool, arguments))
}

/// Chooses an operation and its arguments with one model call
pub struct ToolPlanner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    options: ChatOptions,
}

impl ToolPlanner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: String, options: ChatOptions) -> Self {
        Self {
            llm,
            system_prompt,
            options,
        }
    }

    /// Plan one invocation for the query from the listed operations
    pub async fn plan(&self, query: &str, tools: &[ToolDescriptor]) -> Result<ToolInvocation> {
        let prompt = build_tool_selection_prompt(query, tools);
        let reply = self
            .llm
            .complete(&self.system_prompt, &prompt, Some(self.options.clone()))
            .await?;
        debug!("Planner reply: {}", reply);

        let raw = parse_invocation(&reply)?;
        let invocation = resolve_invocation(raw, tools)?;
        debug!(
            "Planned {} with {} argument(s)",
            invocation.tool,
            invocation.arguments.len()
        );
        Ok(invocation)
    }
}
