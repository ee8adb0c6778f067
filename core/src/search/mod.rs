//! Web search fallback clients
//!
//! Searching never fails from the caller's point of view: transport and
//! payload problems are folded into [`SearchOutcome::Failed`], an empty
//! result set into [`SearchOutcome::NoResults`].

pub mod duckduckgo;
pub mod serper;

pub use duckduckgo::DuckDuckGoClient;
pub use serper::SerperClient;

use crate::config::{SearchConfig, SearchProvider};
use crate::error::{ConfigError, Result, SearchError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Text reported when a search produced nothing
pub const NO_ANSWER: &str = "No answer found";

/// Prefix of the text reported when a search failed
pub const SEARCH_ERROR_PREFIX: &str = "Error performing web search: ";

/// Result of one web search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Formatted result blob
    Found(String),
    /// The provider answered but had nothing useful
    NoResults,
    /// Transport, status or payload failure
    Failed(String),
}

impl SearchOutcome {
    /// Build an outcome from extracted text, treating blank text as no results
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Found(text)
        }
    }

    /// Render the outcome the way it is shown to users and logs
    pub fn as_text(&self) -> String {
        match self {
            SearchOutcome::Found(text) => text.clone(),
            SearchOutcome::NoResults => NO_ANSWER.to_string(),
            SearchOutcome::Failed(message) => format!("{}{}", SEARCH_ERROR_PREFIX, message),
        }
    }

    /// Whether the outcome carries results worth synthesising an answer from
    pub fn is_usable(&self) -> bool {
        matches!(self, SearchOutcome::Found(text) if !text.trim().is_empty())
    }
}

impl From<SearchError> for SearchOutcome {
    fn from(error: SearchError) -> Self {
        SearchOutcome::Failed(error.to_string())
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// A web search provider
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Search the web for a query
    async fn search(&self, query: &str) -> SearchOutcome;

    /// Provider name for logs
    fn provider_name(&self) -> &str;
}

/// Build the HTTP client shared by the providers
pub(crate) fn build_http_client(config: &SearchConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(concat!("toolroute/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            SearchError::Transport {
                message: format!("Failed to build HTTP client: {}", e),
            }
            .into()
        })
}

/// Create the search client for the configured provider
pub fn create_search_client(config: &SearchConfig) -> Result<Arc<dyn SearchClient>> {
    config.validate().map_err(|message| ConfigError::InvalidValue {
        field: "search".to_string(),
        value: message,
    })?;

    let client: Arc<dyn SearchClient> = match config.provider {
        SearchProvider::Serper => Arc::new(SerperClient::new(config)?),
        SearchProvider::DuckDuckGo => Arc::new(DuckDuckGoClient::new(config)?),
    };

    tracing::debug!("Created {} search client", client.provider_name());
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_text() {
        assert_eq!(SearchOutcome::Found("1. a: b".into()).as_text(), "1. a: b");
        assert_eq!(SearchOutcome::NoResults.as_text(), "No answer found");
        assert_eq!(
            SearchOutcome::Failed("timed out".into()).as_text(),
            "Error performing web search: timed out"
        );
    }

    #[test]
    fn test_only_found_is_usable() {
        assert!(SearchOutcome::Found("Paris".into()).is_usable());
        assert!(!SearchOutcome::Found("   ".into()).is_usable());
        assert!(!SearchOutcome::NoResults.is_usable());
        assert!(!SearchOutcome::Failed("x".into()).is_usable());
        assert_eq!(SearchOutcome::from_text("\n".into()), SearchOutcome::NoResults);
    }

    #[test]
    fn test_search_error_becomes_failed() {
        let outcome: SearchOutcome = SearchError::Status { status: 503 }.into();
        assert_eq!(
            outcome.as_text(),
            "Error performing web search: Search provider returned status 503"
        );
    }

    #[test]
    fn test_factory_rejects_keyless_serper() {
        let config = SearchConfig::new(SearchProvider::Serper);
        assert!(create_search_client(&config).is_err());

        let config = SearchConfig::new(SearchProvider::DuckDuckGo);
        let client = create_search_client(&config).unwrap();
        assert_eq!(client.provider_name(), "duckduckgo");
    }
}
