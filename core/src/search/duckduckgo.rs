//! DuckDuckGo Instant Answer client

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::search::{build_http_client, SearchClient, SearchOutcome};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Keyless search through the DuckDuckGo Instant Answer API
pub struct DuckDuckGoClient {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoClient {
    /// Create a new DuckDuckGo client
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            endpoint: config.endpoint().to_string(),
        })
    }

    async fn fetch(&self, query: &str) -> std::result::Result<Value, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
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

        // The API answers with application/x-javascript, so decode the body ourselves
        let body = response.text().await.map_err(|e| SearchError::Transport {
            message: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| SearchError::Payload {
            message: e.to_string(),
        })
    }
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Pick the instant answer out of a DuckDuckGo response
///
/// Order: `AbstractText`, `Answer`, then the first related topic with text,
/// looking one level into grouped `Topics`.
pub(crate) fn extract_answer(data: &Value) -> Option<String> {
    if let Some(text) = non_empty_text(data.get("AbstractText")) {
        return Some(text);
    }
    if let Some(text) = non_empty_text(data.get("Answer")) {
        return Some(text);
    }

    let topics = data.get("RelatedTopics")?.as_array()?;
    topics.iter().find_map(|topic| {
        non_empty_text(topic.get("Text")).or_else(|| {
            topic
                .get("Topics")
                .and_then(Value::as_array)
                .and_then(|nested| nested.iter().find_map(|t| non_empty_text(t.get("Text"))))
        })
    })
}

#[async_trait]
impl SearchClient for DuckDuckGoClient {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.fetch(query).await {
            Ok(data) => match extract_answer(&data) {
                Some(text) => SearchOutcome::Found(text),
                None => {
                    debug!("DuckDuckGo had no instant answer");
                    SearchOutcome::NoResults
                }
            },
            Err(e) => {
                warn!("DuckDuckGo search failed: {}", e);
                e.into()
            }
        }
    }

    fn provider_name(&self) -> &str {
        "duckduckgo"
    }
}
