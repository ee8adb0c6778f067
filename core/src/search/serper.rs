//! Serper (google.serper.dev) search client

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::search::{build_http_client, SearchClient, SearchOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Serper search client
pub struct SerperClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
    knowledge_graph: Option<KnowledgeGraph>,
    answer_box: Option<AnswerBox>,
}

#[derive(Debug, Default, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeGraph {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    title: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    snippet: String,
}

impl SerperClient {
    /// Create a new Serper client
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SearchError::MissingApiKey {
                provider: "serper".to_string(),
            })?;

        Ok(Self {
            client: build_http_client(config)?,
            endpoint: config.endpoint().to_string(),
            api_key,
            max_results: config.max_results,
        })
    }

    async fn fetch(&self, query: &str) -> std::result::Result<SerperResponse, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
            .map_err(|e| SearchError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<SerperResponse>()
            .await
            .map_err(|e| SearchError::Payload {
                message: e.to_string(),
            })
    }
}

/// Format a Serper response into the result blob
pub(crate) fn format_results(response: &SerperResponse, max_results: usize) -> String {
    let mut lines: Vec<String> = response
        .organic
        .iter()
        .take(max_results)
        .enumerate()
        .map(|(i, result)| format!("{}. {}: {}", i + 1, result.title, result.snippet))
        .collect();

    if let Some(kg) = &response.knowledge_graph {
        if !kg.title.is_empty() && !kg.description.is_empty() {
            lines.push(format!("Knowledge Graph: {} - {}", kg.title, kg.description));
        }
    }

    if let Some(answer) = &response.answer_box {
        if !answer.answer.is_empty() {
            lines.push(format!("Answer: {}", answer.answer));
        } else if !answer.title.is_empty() && !answer.snippet.is_empty() {
            lines.push(format!("Featured Snippet: {} - {}", answer.title, answer.snippet));
        }
    }

    lines.join("\n")
}

#[async_trait]
impl SearchClient for SerperClient {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.fetch(query).await {
            Ok(response) => {
                let outcome = SearchOutcome::from_text(format_results(&response, self.max_results));
                debug!("Serper search returned usable results: {}", outcome.is_usable());
                outcome
            }
            Err(e) => {
                warn!("Serper search failed: {}", e);
                e.into()
            }
        }
    }

    fn provider_name(&self) -> &str {
        "serper"
    }
}
