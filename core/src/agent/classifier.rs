//! Intent classification

use crate::agent::prompt::build_classification_prompt;
use crate::error::Result;
use crate::llm::{ChatOptions, LlmClient};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Replies longer than this many words are not searched for a label
const MAX_PHRASE_WORDS: usize = 8;

/// What kind of handling a query needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Bmi,
    Weather,
    Search,
    General,
    /// The model's reply matched no known label
    None,
}

impl Intent {
    /// Labels the model is asked to choose from
    pub const LABELS: [Intent; 4] = [Intent::Bmi, Intent::Weather, Intent::Search, Intent::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Bmi => "bmi",
            Intent::Weather => "weather",
            Intent::Search => "search",
            Intent::General => "general",
            Intent::None => "none",
        }
    }

    /// Whether queries with this intent are answered by a tool server
    pub fn is_tool(&self) -> bool {
        matches!(self, Intent::Bmi | Intent::Weather)
    }

    fn from_label(label: &str) -> Option<Intent> {
        Self::LABELS.into_iter().find(|intent| intent.as_str() == label)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a raw model reply onto an intent.
///
/// Never fails: anything unrecognised is [`Intent::None`].
pub fn parse_intent(reply: &str) -> Intent {
    let cleaned = reply
        .trim()
        .to_lowercase()
        .replace(['\'', '"', '`'], "");
    let cleaned = cleaned
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim();

    if let Some(intent) = Intent::from_label(cleaned) {
        return intent;
    }

    let words: Vec<&str> = cleaned
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() || words.len() > MAX_PHRASE_WORDS {
        return Intent::None;
    }

    let mut found = Intent::LABELS
        .into_iter()
        .filter(|intent| words.contains(&intent.as_str()));
    match (found.next(), found.next()) {
        (Some(intent), None) => intent,
        _ => Intent::None,
    }
}

/// Labels queries with one model call each
pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    options: ChatOptions,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: String, options: ChatOptions) -> Self {
        Self {
            llm,
            system_prompt,
            options,
        }
    }

    /// Classify a query. Only a failing model call is an error.
    pub async fn classify(&self, query: &str) -> Result<Intent> {
        let prompt = build_classification_prompt(query);
        let reply = self
            .llm
            .complete(&self.system_prompt, &prompt, Some(self.options.clone()))
            .await?;

        let intent = parse_intent(&reply);
        debug!("Classifier reply {:?} parsed as {}", reply, intent);
        info!(intent = %intent, "Query classified");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::SYSTEM_PROMPT;
    use crate::testing::ScriptedLlm;

    #[test]
    fn test_exact_labels() {
        assert_eq!(parse_intent("bmi"), Intent::Bmi);
        assert_eq!(parse_intent("weather"), Intent::Weather);
        assert_eq!(parse_intent("search"), Intent::Search);
        assert_eq!(parse_intent("general"), Intent::General);
    }

    #[test]
    fn test_case_quotes_and_punctuation() {
        assert_eq!(parse_intent("  'Weather'\n"), Intent::Weather);
        assert_eq!(parse_intent("\"BMI\"."), Intent::Bmi);
        assert_eq!(parse_intent("`search`"), Intent::Search);
        assert_eq!(parse_intent("General!"), Intent::General);
    }

    #[test]
    fn test_short_phrase_with_one_label() {
        assert_eq!(parse_intent("The intent is: weather"), Intent::Weather);
        assert_eq!(parse_intent("bmi calculation"), Intent::Bmi);
    }

    #[test]
    fn test_unrecognised_replies_are_none() {
        assert_eq!(parse_intent(""), Intent::None);
        assert_eq!(parse_intent("stocks"), Intent::None);
        assert_eq!(parse_intent("weather or search"), Intent::None);
        assert_eq!(parse_intent("bmis"), Intent::None);
        assert_eq!(
            parse_intent("I think this could be weather but honestly it is hard to say for sure"),
            Intent::None
        );
    }

    #[test]
    fn test_none_is_not_a_label() {
        assert_eq!(parse_intent("none"), Intent::None);
        assert!(!Intent::None.is_tool());
        assert!(Intent::Bmi.is_tool());
        assert_eq!(Intent::Weather.to_string(), "weather");
    }

    #[tokio::test]
    async fn test_classify_sends_prompt_and_parses() {
        let llm = Arc::new(ScriptedLlm::new(vec!["'bmi'"]));
        let classifier =
            IntentClassifier::new(llm.clone(), SYSTEM_PROMPT.to_string(), ChatOptions::default());

        let intent = classifier
            .classify("Calculate BMI for weight 70kg and height 1.75m")
            .await
            .unwrap();

        assert_eq!(intent, Intent::Bmi);
        let calls = llm.calls();
        assert_eq!(calls[0].system, SYSTEM_PROMPT);
        assert!(calls[0].user.contains("\"Calculate BMI for weight 70kg and height 1.75m\""));
    }

    #[tokio::test]
    async fn test_classify_propagates_model_failure() {
        let llm = Arc::new(ScriptedLlm::failing());
        let classifier = IntentClassifier::new(llm, SYSTEM_PROMPT.to_string(), ChatOptions::default());
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(err.is_model_unavailable());
    }
}
