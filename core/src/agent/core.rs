//! QueryAgent implementation

use super::config::AgentConfig;
use crate::agent::classifier::{Intent, IntentClassifier};
use crate::agent::planner::ToolPlanner;
use crate::agent::prompt::{build_direct_prompt, build_synthesis_prompt, SYSTEM_PROMPT};
use crate::agent::{Agent, AgentAnswer, AgentResult, Route};
use crate::error::Result;
use crate::llm::{ChatOptions, LlmClient};
use crate::search::SearchClient;
use crate::tools::{
    ToolConnector, ToolDescriptor, ToolInvocation, ToolOutput, ToolOutputFormatter,
    ToolRegistry, ToolSession,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Routes each query to a tool server, web search or a direct model answer
pub struct QueryAgent {
    config: AgentConfig,
    system_prompt: String,
    options: ChatOptions,
    llm: Arc<dyn LlmClient>,
    classifier: IntentClassifier,
    planner: ToolPlanner,
    connector: Arc<dyn ToolConnector>,
    registry: ToolRegistry,
    search: Option<Arc<dyn SearchClient>>,
    formatter: ToolOutputFormatter,
}

impl QueryAgent {
    pub(crate) fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmClient>,
        connector: Arc<dyn ToolConnector>,
        search: Option<Arc<dyn SearchClient>>,
        registry: ToolRegistry,
        options: ChatOptions,
    ) -> Self {
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        Self {
            classifier: IntentClassifier::new(llm.clone(), system_prompt.clone(), options.clone()),
            planner: ToolPlanner::new(llm.clone(), system_prompt.clone(), options.clone()),
            config,
            system_prompt,
            options,
            llm,
            connector,
            registry,
            search,
            formatter: ToolOutputFormatter::new(),
        }
    }

    /// Tool servers this agent can route to
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Whether a web search client is configured
    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Open the server registered for `intent`, list its operations and close it
    pub async fn list_operations(&self, intent: &str) -> Result<Vec<ToolDescriptor>> {
        let server = self.registry.server_for(intent)?;
        let mut session = self.connector.open(server).await?;
        let operations = session.list_operations().await;
        session.close().await;
        operations
    }

    async fn answer_query(&self, query: &str) -> Result<AgentAnswer> {
        let started = Instant::now();

        let (intent, classification_error) = match self.classifier.classify(query).await {
            Ok(intent) => (intent, None),
            Err(e) => {
                warn!("Classification failed, treating query as unrecognised: {}", e);
                (Intent::None, Some(format!("classification failed: {}", e)))
            }
        };

        let answer = match intent {
            _ if intent.is_tool() => match self.answer_with_tool(intent, query).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(intent = %intent, "Tool branch failed, answering directly: {}", e);
                    self.answer_directly(query, intent)
                        .await?
                        .with_fallback_reason(format!("tool branch failed: {}", e))
                }
            },
            Intent::Search => self.answer_with_search(query, intent).await?,
            Intent::General | Intent::None if self.config.search_general => {
                self.answer_with_search(query, intent).await?
            }
            _ => self.answer_directly(query, intent).await?,
        };

        let answer = match classification_error {
            Some(reason) if !answer.is_fallback() => answer.with_fallback_reason(reason),
            _ => answer,
        };

        let answer = answer.with_duration(started.elapsed().as_millis() as u64);
        info!(route = %answer.route, duration_ms = answer.duration_ms, "Query answered");
        Ok(answer)
    }

    async fn answer_with_tool(&self, intent: Intent, query: &str) -> Result<AgentAnswer> {
        let server = self.registry.server_for(intent.as_str())?;
        info!(server = %server.name, "Routing query to tool server");

        let mut session = self.connector.open(server).await?;
        let outcome = self.run_tool_session(session.as_mut(), query).await;
        session.close().await;

        let (invocation, output) = outcome?;
        let answer = self.formatter.format_answer(&invocation, &output);

        Ok(AgentAnswer::new(
            answer,
            intent,
            Route::Tool {
                server: server.name.clone(),
                operation: invocation.tool,
            },
        ))
    }

    async fn run_tool_session(
        &self,
        session: &mut dyn ToolSession,
        query: &str,
    ) -> Result<(ToolInvocation, ToolOutput)> {
        let operations = session.list_operations().await?;
        let invocation = self.planner.plan(query, &operations).await?;
        let output = session.invoke(&invocation).await?;
        Ok((invocation, output))
    }

    async fn answer_with_search(&self, query: &str, intent: Intent) -> Result<AgentAnswer> {
        let search = match &self.search {
            Some(search) => search,
            None => return self.answer_directly(query, intent).await,
        };

        let outcome = search.search(query).await;
        if !outcome.is_usable() {
            info!(provider = search.provider_name(), "No usable search results: {}", outcome);
            return Ok(self
                .answer_directly(query, intent)
                .await?
                .with_fallback_reason(outcome.as_text()));
        }

        let prompt = build_synthesis_prompt(query, &outcome.as_text());
        match self
            .llm
            .complete(&self.system_prompt, &prompt, Some(self.options.clone()))
            .await
        {
            Ok(answer) => Ok(AgentAnswer::new(answer, intent, Route::SearchSynthesis)),
            Err(e) => {
                warn!("Synthesis from search results failed, answering directly: {}", e);
                Ok(self
                    .answer_directly(query, intent)
                    .await?
                    .with_fallback_reason(format!("synthesis failed: {}", e)))
            }
        }
    }

    async fn answer_directly(&self, query: &str, intent: Intent) -> Result<AgentAnswer> {
        let prompt = build_direct_prompt(query);
        let answer = self
            .llm
            .complete(&self.system_prompt, &prompt, Some(self.options.clone()))
            .await
            .map_err(|e| {
                error!("Direct answer failed: {}", e);
                e
            })?;

        Ok(AgentAnswer::new(answer, intent, Route::Direct))
    }
}

#[async_trait]
impl Agent for QueryAgent {
    async fn answer(&self, query: &str) -> AgentResult<AgentAnswer> {
        let span = info_span!("query", id = %Uuid::new_v4());
        self.answer_query(query).instrument(span).await
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn agent_type(&self) -> &str {
        "query_router"
    }
}
