//! Answer structures returned by the agent

use crate::agent::Intent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which path produced the answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// A tool server operation
    Tool { server: String, operation: String },
    /// Model answer grounded in web search results
    SearchSynthesis,
    /// Model answer without tools or search
    Direct,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Tool { server, operation } => write!(f, "tool {}/{}", server, operation),
            Route::SearchSynthesis => write!(f, "search"),
            Route::Direct => write!(f, "direct"),
        }
    }
}

/// Result of answering one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAnswer {
    /// Final answer text
    pub answer: String,

    /// Intent the classifier chose
    pub intent: Intent,

    /// Path that produced the answer
    pub route: Route,

    /// Why a preferred path was abandoned, if it was
    pub fallback_reason: Option<String>,

    /// Total time in milliseconds
    pub duration_ms: u64,
}

impl AgentAnswer {
    pub fn new(answer: String, intent: Intent, route: Route) -> Self {
        Self {
            answer,
            intent,
            route,
            fallback_reason: None,
            duration_ms: 0,
        }
    }

    /// Record why the preferred route was not used
    pub fn with_fallback_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_serialization() {
        let route = Route::Tool {
            server: "bmi".to_string(),
            operation: "calculate_bmi".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&route).unwrap(),
            serde_json::json!({"kind": "tool", "server": "bmi", "operation": "calculate_bmi"})
        );
        assert_eq!(route.to_string(), "tool bmi/calculate_bmi");
        assert_eq!(
            serde_json::to_value(Route::SearchSynthesis).unwrap(),
            serde_json::json!({"kind": "search_synthesis"})
        );
    }

    #[test]
    fn test_answer_builders() {
        let answer = AgentAnswer::new("Paris".to_string(), Intent::General, Route::Direct)
            .with_fallback_reason("search returned no results")
            .with_duration(12);
        assert!(answer.is_fallback());
        assert_eq!(answer.duration_ms, 12);
    }
}
