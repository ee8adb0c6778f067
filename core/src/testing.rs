//! Scripted collaborators for unit tests

use crate::config::ToolServerConfig;
use crate::error::{LlmError, Result, ToolError};
use crate::llm::{ChatOptions, LlmClient, LlmMessage, LlmResponse, MessageRole};
use crate::search::{SearchClient, SearchOutcome};
use crate::tools::{ToolConnector, ToolDescriptor, ToolInvocation, ToolOutput, ToolSession};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Prompts of one model call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub options: Option<ChatOptions>,
}

/// LLM stub answering from a queue, or from a function of the user prompt.
/// `None` entries fail with a network error, as does an exhausted queue.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Option<String>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<&str>) -> Self {
        Self::from_script(replies.into_iter().map(Some).collect())
    }

    pub fn from_script(script: Vec<Option<&str>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().map(|s| s.map(str::to_string)).collect()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails
    pub fn failing() -> Self {
        Self::from_script(Vec::new())
    }

    pub fn responder<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(respond)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let text_of = |role: MessageRole| {
            messages
                .iter()
                .filter(|m| m.role == role)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };
        let call = RecordedCall {
            system: text_of(MessageRole::System),
            user: text_of(MessageRole::User),
            options,
        };

        let reply = match &self.responder {
            Some(respond) => respond(&call.user),
            None => self.script.lock().unwrap().pop_front().flatten(),
        };
        self.calls.lock().unwrap().push(call);

        let reply = reply.ok_or_else(|| LlmError::Network {
            message: "scripted failure".to_string(),
        })?;

        Ok(LlmResponse {
            message: LlmMessage::assistant(reply),
            usage: None,
            model: "scripted".to_string(),
            finish_reason: None,
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct SessionLog {
    opened: AtomicUsize,
    closed: AtomicUsize,
    servers: Mutex<Vec<String>>,
    invocations: Mutex<Vec<ToolInvocation>>,
}

/// Tool connector whose sessions list fixed operations and return canned text
#[derive(Default)]
pub struct StubConnector {
    operations: Vec<ToolDescriptor>,
    results: HashMap<String, std::result::Result<String, String>>,
    unavailable: bool,
    log: Arc<SessionLog>,
}

impl StubConnector {
    pub fn new(operations: Vec<ToolDescriptor>) -> Self {
        Self {
            operations,
            ..Default::default()
        }
    }

    /// Every `open` fails as if the process could not start
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn with_result(mut self, operation: &str, text: &str) -> Self {
        self.results
            .insert(operation.to_string(), Ok(text.to_string()));
        self
    }

    pub fn with_failure(mut self, operation: &str, message: &str) -> Self {
        self.results
            .insert(operation.to_string(), Err(message.to_string()));
        self
    }

    pub fn opened(&self) -> usize {
        self.log.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.log.closed.load(Ordering::SeqCst)
    }

    pub fn servers_opened(&self) -> Vec<String> {
        self.log.servers.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.log.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolConnector for StubConnector {
    async fn open(&self, server: &ToolServerConfig) -> Result<Box<dyn ToolSession>> {
        if self.unavailable {
            return Err(ToolError::Unavailable {
                server: server.name.clone(),
                message: "failed to start".to_string(),
            }
            .into());
        }

        self.log.opened.fetch_add(1, Ordering::SeqCst);
        self.log.servers.lock().unwrap().push(server.name.clone());

        Ok(Box::new(StubSession {
            operations: self.operations.clone(),
            results: self.results.clone(),
            log: self.log.clone(),
        }))
    }
}

struct StubSession {
    operations: Vec<ToolDescriptor>,
    results: HashMap<String, std::result::Result<String, String>>,
    log: Arc<SessionLog>,
}

#[async_trait]
impl ToolSession for StubSession {
    async fn list_operations(&mut self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.operations.clone())
    }

    async fn invoke(&mut self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.log.invocations.lock().unwrap().push(invocation.clone());

        match self.results.get(&invocation.tool) {
            Some(Ok(text)) => Ok(ToolOutput::new(text.clone())),
            Some(Err(message)) => Err(ToolError::InvocationFailed {
                name: invocation.tool.clone(),
                message: message.clone(),
            }
            .into()),
            None => Err(ToolError::EmptyContent {
                name: invocation.tool.clone(),
            }
            .into()),
        }
    }

    async fn close(&mut self) {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Search client returning a fixed outcome
pub struct StubSearch {
    outcome: SearchOutcome,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn new(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for StubSearch {
    async fn search(&self, query: &str) -> SearchOutcome {
        self.queries.lock().unwrap().push(query.to_string());
        self.outcome.clone()
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}

/// Operations listed by the BMI server
pub fn bmi_operations() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor::new(
        "calculate_bmi",
        "Calculate BMI given weight in kg and height in meters",
        json!({
            "type": "object",
            "properties": {
                "weight_kg": {"type": "number"},
                "height_m": {"type": "number"}
            },
            "required": ["weight_kg", "height_m"]
        }),
    )]
}

/// Operations listed by the weather server
pub fn weather_operations() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_alerts",
            "Get weather alerts for a US state.",
            json!({
                "type": "object",
                "properties": {"state": {"type": "string"}},
                "required": ["state"]
            }),
        ),
        ToolDescriptor::new(
            "get_forecast",
            "Get weather forecast for a location.",
            json!({
                "type": "object",
                "properties": {
                    "latitude": {"type": "number"},
                    "longitude": {"type": "number"}
                },
                "required": ["latitude", "longitude"]
            }),
        ),
    ]
}
