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

//! Stdio transport tests: feed JSON-RPC lines in, read responses out.

use hed_mcp::{HedMcpConfig, McpError, McpServer};
use serde_json::{json, Value};
use std::path::Path;

fn server() -> McpServer {
    McpServer::new(HedMcpConfig {
        schema_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas"),
        ..Default::default()
    })
}

async fn exchange(server: &mut McpServer, lines: &[Value]) -> Vec<Value> {
    let input: String = lines.iter().map(|l| format!("{}\n", l)).collect();
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn request(id: u64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

#[tokio::test]
async fn test_full_session() {
    let mut server = server();
    let responses = exchange(
        &mut server,
        &[
            request(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "0.1"}
                }),
            ),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            request(2, "tools/list", json!({})),
            request(
                3,
                "tools/call",
                json!({
                    "name": "validateHedString",
                    "arguments": {"hedString": "Event/Sensory-event, Red", "hedVersion": "8.4.0"}
                }),
            ),
        ],
    )
    .await;

    assert_eq!(responses.len(), 3);
    assert!(server.is_initialized());

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "hed-mcp");

    let names: Vec<&str> = responses[1]["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["validateHedString", "validateHedTsv", "validateHedSidecar", "getFileFromPath"]
    );

    let call = &responses[2]["result"];
    assert_eq!(call["isError"], false);
    let payload: Value = serde_json::from_str(call["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(payload, json!({"errors": [], "warnings": []}));
}

#[tokio::test]
async fn test_tool_call_with_validation_errors() {
    let mut server = server();
    let responses = exchange(
        &mut server,
        &[request(
            7,
            "tools/call",
            json!({
                "name": "validateHedString",
                "arguments": {"hedString": "Duration", "hedVersion": "8.4.0"}
            }),
        )],
    )
    .await;

    let call = &responses[0]["result"];
    assert_eq!(call["isError"], true);
    let payload: Value = serde_json::from_str(call["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(payload["errors"][0]["code"], "TAG_REQUIRES_CHILD");
}

#[tokio::test]
async fn test_protocol_errors() {
    let mut server = server();
    let input = "{broken\n\n".to_string()
        + &request(2, "resources/list", json!({})).to_string()
        + "\n"
        + &request(3, "tools/call", json!({"name": "noSuchTool", "arguments": {}})).to_string()
        + "\n"
        + &request(4, "tools/call", json!({"name": "validateHedString", "arguments": {"hedString": 5}}))
            .to_string()
        + "\n";
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);

    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["error"]["code"], -32601);
    assert_eq!(responses[2]["error"]["code"], -32601);
    assert_eq!(responses[3]["error"]["code"], -32602);
    assert_eq!(responses[3]["id"], 4);
}

#[tokio::test]
async fn test_notifications_produce_no_output() {
    let mut server = server();
    let responses = exchange(
        &mut server,
        &[
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {}}),
        ],
    )
    .await;
    assert!(responses.is_empty());
}

#[tokio::test]
async fn test_read_error_is_returned() {
    let mut server = server();
    let mut input = request(1, "ping", json!({})).to_string().into_bytes();
    input.extend_from_slice(b"\n\xff\xfe\n");
    let mut output = Vec::new();

    let result = server.serve(input.as_slice(), &mut output).await;
    assert!(matches!(result, Err(McpError::Io(_))));

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 1);
}
