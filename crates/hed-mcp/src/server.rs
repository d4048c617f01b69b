// Dweve HED MCP - Hierarchical Event Descriptor validation tools
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! MCP server over stdio.

use crate::error::{McpError, McpResult};
use crate::protocol::{
    CallToolParams, Implementation, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ToolsCapability, INTERNAL_JSONRPC_ERROR,
    INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::tools::{execute_tool, get_tools, ToolContext};
use crate::{SERVER_NAME, VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

/// Server configuration shared by the stdio and HTTP transports.
#[derive(Debug, Clone)]
pub struct HedMcpConfig {
    /// Server name reported in the protocol handshake.
    pub name: String,

    /// Server version reported in the protocol handshake.
    pub version: String,

    /// Directory holding `HED{version}.xml` / `HED_{library}_{version}.xml`.
    pub schema_dir: PathBuf,

    /// Listen address of the HTTP transport.
    pub bind: SocketAddr,
}

impl Default for HedMcpConfig {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: VERSION.to_string(),
            schema_dir: PathBuf::from("schemas"),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

/// HED MCP server.
///
/// Speaks JSON-RPC 2.0, one message per line. Requests are handled in
/// arrival order; the schema cache inside the [`ToolContext`] is the only
/// state shared with other transports.
pub struct McpServer {
    config: HedMcpConfig,
    context: Arc<ToolContext>,
    initialized: bool,
}

impl McpServer {
    /// Create a server with a local validator rooted at `config.schema_dir`.
    ///
    /// ```
    /// use hed_mcp::{HedMcpConfig, McpServer};
    /// use std::path::PathBuf;
    ///
    /// let server = McpServer::new(HedMcpConfig {
    ///     schema_dir: PathBuf::from("/opt/hed/schemas"),
    ///     ..Default::default()
    /// });
    /// assert!(!server.is_initialized());
    /// ```
    pub fn new(config: HedMcpConfig) -> Self {
        let context = Arc::new(ToolContext::new(config.schema_dir.clone()));
        Self::with_context(config, context)
    }

    pub fn with_context(config: HedMcpConfig, context: Arc<ToolContext>) -> Self {
        Self {
            config,
            context,
            initialized: false,
        }
    }

    pub fn context(&self) -> &Arc<ToolContext> {
        &self.context
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Serve stdin/stdout until stdin is closed.
    pub async fn run_stdio_async(&mut self) -> McpResult<()> {
        info!("HED MCP server starting on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve line-delimited JSON-RPC from `input`, writing responses to `output`.
    ///
    /// Returns at end of input. A read failure is returned as an error.
    pub async fn serve<R, W>(&mut self, input: R, mut output: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("Received: {}", line);

                    if let Some(response) = self.handle_line(line).await {
                        let response_str = serde_json::to_string(&response)?;
                        debug!("Sending: {}", response_str);
                        output.write_all(response_str.as_bytes()).await?;
                        output.write_all(b"\n").await?;
                        output.flush().await?;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Read error: {}", e);
                    return Err(McpError::Io(e));
                }
            }
        }
        info!("Input closed, stopping");
        Ok(())
    }

    /// Handle one raw line. Returns `None` for notifications.
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Unparsable message: {}", e);
                Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle a single JSON-RPC message.
    ///
    /// # Supported Methods
    ///
    /// - `initialize` - Protocol handshake
    /// - `initialized`, `notifications/initialized` - Handshake completion
    /// - `shutdown` - Reset to the uninitialized state
    /// - `ping` - Liveness check
    /// - `tools/list` - List the HED tools
    /// - `tools/call` - Execute a tool
    ///
    /// Notifications never produce a response, whatever their method.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let notification = request.is_notification();
        let id = request.id;

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "initialized" | "notifications/initialized" => {
                info!("Client completed initialization");
                JsonRpcResponse::success(id, json!({}))
            }
            "shutdown" => {
                info!("Server shutting down");
                self.initialized = false;
                JsonRpcResponse::success(id, json!({}))
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => to_response(id, &ListToolsResult { tools: get_tools() }),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            method => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
            }
        };

        if notification {
            None
        } else {
            Some(response)
        }
    }

    fn handle_initialize(&mut self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::from_error(id, &e),
        };

        self.initialized = true;
        info!(
            client = params.client_info.as_ref().map_or("unknown", |c| c.name.as_str()),
            protocol = %params.protocol_version,
            "Server initialized"
        );

        to_response(
            id,
            &InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: Some(false),
                    }),
                },
                server_info: Implementation {
                    name: self.config.name.clone(),
                    version: self.config.version.clone(),
                },
                instructions: Some(
                    "Validate HED annotations: strings, BIDS TSV event files and JSON sidecars."
                        .to_string(),
                ),
            },
        )
    }

    /// Execute a tool. Validation problems come back as a successful
    /// response whose result has `isError: true`.
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::from_error(id, &e),
        };

        match execute_tool(&self.context, &params.name, params.arguments).await {
            Ok(result) => to_response(id, &result),
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call rejected");
                JsonRpcResponse::from_error(id, &e)
            }
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let params = params.ok_or_else(|| McpError::InvalidArguments("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidArguments(e.to_string()))
}

fn to_response<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_JSONRPC_ERROR, e.to_string()),
    }
}
