//! MCP (Model Context Protocol) client over stdio
//!
//! Each tool server is an external process speaking newline-delimited
//! JSON-RPC 2.0 on stdin/stdout. [`StdioConnector`] spawns the process and
//! performs the handshake, [`McpSession`] carries the requests.

use crate::config::ToolServerConfig;
use crate::error::{Result, ToolError};
use crate::tools::{ToolConnector, ToolDescriptor, ToolInvocation, ToolOutput, ToolSession};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// MCP protocol revision announced during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// How long `close` waits for the process to exit after being killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Upper bound on `tools/list` pages fetched for one listing
const MAX_LIST_PAGES: usize = 32;

/// A JSON-RPC session with one MCP server
pub struct McpSession<R, W> {
    server: String,
    reader: BufReader<R>,
    writer: W,
    next_id: u64,
    request_timeout: Duration,
    process: Option<Child>,
}

/// Session backed by a spawned child process
pub type StdioSession = McpSession<ChildStdout, ChildStdin>;

impl<R, W> McpSession<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected reader/writer pair
    pub fn new<S: Into<String>>(server: S, reader: R, writer: W, request_timeout: Duration) -> Self {
        Self {
            server: server.into(),
            reader: BufReader::new(reader),
            writer,
            next_id: 0,
            request_timeout,
            process: None,
        }
    }

    fn with_process(mut self, process: Child) -> Self {
        self.process = Some(process);
        self
    }

    /// Perform the MCP handshake: `initialize` then `notifications/initialized`
    pub async fn initialize(&mut self) -> Result<Value> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "toolroute",
                "version": crate::VERSION
            }
        });

        let response = self.request("initialize", Some(params)).await?;
        let result = Self::into_result("initialize", response)?;

        self.notify("notifications/initialized").await?;

        let version = result
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        debug!("MCP server '{}' initialized (protocol {})", self.server, version);

        Ok(result)
    }

    /// List available tools, following pagination cursors
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        for _ in 0..MAX_LIST_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let response = self.request("tools/list", params).await?;
            let result = Self::into_result("tools/list", response)?;

            let page = result.get("tools").cloned().unwrap_or_else(|| json!([]));
            let page: Vec<ToolDescriptor> =
                serde_json::from_value(page).map_err(|e| ToolError::Protocol {
                    message: format!("Malformed tools/list result: {}", e),
                })?;
            tools.extend(page);

            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            match &cursor {
                None => {
                    debug!("MCP server '{}' exposes {} tools", self.server, tools.len());
                    return Ok(tools);
                }
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    return Err(ToolError::Protocol {
                        message: format!("tools/list repeated cursor '{}'", next),
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        Err(ToolError::Protocol {
            message: format!("tools/list exceeded {} pages", MAX_LIST_PAGES),
        }
        .into())
    }

    /// Call a tool and return the text of its first content element
    pub async fn call_tool(&mut self, tool_name: &str, arguments: Value) -> Result<ToolOutput> {
        let params = json!({
            "name": tool_name,
            "arguments": arguments
        });

        let response = self
            .request("tools/call", Some(params))
            .await
            .map_err(|e| match e {
                crate::error::Error::Timeout(_) => ToolError::Timeout {
                    name: tool_name.to_string(),
                }
                .into(),
                other => other,
            })?;

        if let Some(message) = Self::rpc_error(&response) {
            return Err(ToolError::InvocationFailed {
                name: tool_name.to_string(),
                message,
            }
            .into());
        }

        let result = response.get("result").ok_or_else(|| ToolError::Protocol {
            message: "No result in MCP response".to_string(),
        })?;

        let text = Self::first_text(result).ok_or_else(|| ToolError::EmptyContent {
            name: tool_name.to_string(),
        })?;

        if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            return Err(ToolError::InvocationFailed {
                name: tool_name.to_string(),
                message: text,
            }
            .into());
        }

        Ok(ToolOutput::new(text))
    }

    /// Shut the session down, killing the process if there is one
    pub async fn shutdown(&mut self) {
        let _ = self.writer.shutdown().await;

        if let Some(mut process) = self.process.take() {
            if let Err(e) = process.start_kill() {
                debug!("MCP server '{}' already exited: {}", self.server, e);
            }
            if timeout(SHUTDOWN_GRACE, process.wait()).await.is_err() {
                warn!("MCP server '{}' did not exit after kill", self.server);
            }
        }
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Send a JSON-RPC request and wait for the response with the same id
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_request_id();
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method
        });
        if let Some(params) = params {
            request["params"] = params;
        }

        debug!("MCP -> {} #{} {}", self.server, id, method);

        let limit = self.request_timeout;
        let response = timeout(limit, async {
            self.write_message(&request).await?;
            self.read_response(id).await
        })
        .await??;

        Ok(response)
    }

    async fn notify(&mut self, method: &str) -> Result<()> {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method
        });
        self.write_message(&notification).await
    }

    async fn write_message(&mut self, message: &Value) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read lines until the response for `id` arrives, skipping notifications
    async fn read_response(&mut self, id: u64) -> Result<Value> {
        let mut line = String::new();

        loop {
            line.clear();
            let read = self.reader.read_line(&mut line).await?;
            if read == 0 {
                return Err(ToolError::Protocol {
                    message: format!("MCP server '{}' closed its output", self.server),
                }
                .into());
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let message: Value = match serde_json::from_str(trimmed) {
                Ok(message) => message,
                Err(_) => {
                    warn!("Ignoring non JSON-RPC output from '{}': {}", self.server, trimmed);
                    continue;
                }
            };

            if message.get("id").and_then(Value::as_u64) == Some(id)
                && (message.get("result").is_some() || message.get("error").is_some())
            {
                return Ok(message);
            }

            if let Some(method) = message.get("method").and_then(Value::as_str) {
                debug!("MCP <- {} {} (ignored)", self.server, method);
            } else {
                debug!("MCP <- {} unexpected message: {}", self.server, trimmed);
            }
        }
    }

    fn into_result(method: &str, response: Value) -> Result<Value> {
        if let Some(message) = Self::rpc_error(&response) {
            return Err(ToolError::Protocol {
                message: format!("{} failed: {}", method, message),
            }
            .into());
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| {
                ToolError::Protocol {
                    message: format!("No result in {} response", method),
                }
                .into()
            })
    }

    fn rpc_error(response: &Value) -> Option<String> {
        let error = response.get("error")?;
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        Some(match error.get("code").and_then(Value::as_i64) {
            Some(code) => format!("{} (code {})", message, code),
            None => message.to_string(),
        })
    }

    fn first_text(result: &Value) -> Option<String> {
        let content = result.get("content")?.as_array()?;
        content
            .iter()
            .find_map(|item| item.get("text").and_then(Value::as_str))
            .map(str::to_string)
    }
}

#[async_trait]
impl<R, W> ToolSession for McpSession<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn list_operations(&mut self) -> Result<Vec<ToolDescriptor>> {
        self.list_tools().await
    }

    async fn invoke(&mut self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.call_tool(&invocation.tool, invocation.arguments.to_json())
            .await
    }

    async fn close(&mut self) {
        self.shutdown().await;
    }
}

/// Spawns tool servers as child processes
#[derive(Debug, Default, Clone)]
pub struct StdioConnector;

impl StdioConnector {
    pub fn new() -> Self {
        Self
    }

    /// Start the server process and complete the handshake
    pub async fn connect(&self, server: &ToolServerConfig) -> Result<StdioSession> {
        let unavailable = |message: String| ToolError::Unavailable {
            server: server.name.clone(),
            message,
        };

        let mut cmd = Command::new(&server.command);
        cmd.args(&server.args)
            .envs(&server.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Starting MCP server '{}': {}", server.name, server.command_line());

        let mut process = cmd
            .spawn()
            .map_err(|e| unavailable(format!("failed to start '{}': {}", server.command_line(), e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| unavailable("no stdin available".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| unavailable("no stdout available".to_string()))?;

        if let Some(stderr) = process.stderr.take() {
            let name = server.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %name, "{}", line);
                }
            });
        }

        let mut session = McpSession::new(
            server.name.clone(),
            stdout,
            stdin,
            Duration::from_secs(server.timeout_seconds),
        )
        .with_process(process);

        if let Err(e) = session.initialize().await {
            session.shutdown().await;
            return Err(unavailable(format!("handshake failed: {}", e)).into());
        }

        Ok(session)
    }
}

#[async_trait]
impl ToolConnector for StdioConnector {
    async fn open(&self, server: &ToolServerConfig) -> Result<Box<dyn ToolSession>> {
        let session = self.connect(server).await?;
        Ok(Box::new(session))
    }
}
