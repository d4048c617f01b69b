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

//! HTTP API tests driven through the router without binding a socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hed_mcp::http::build_router;
use hed_mcp::ToolContext;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn router() -> Router {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas");
    build_router(Arc::new(ToolContext::new(dir)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = router();
    let (status, body) = send(&app, empty("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_validate_string_endpoint() {
    let app = router();
    let (status, body) = send(
        &app,
        post_json(
            "/validate/string",
            json!({"hedString": "Sensory-event, Bogus", "hedVersion": "8.4.0"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    assert_eq!(body["errors"][0]["code"], "TAG_INVALID");
    assert_eq!(body["errors"][0]["detailedCode"], "invalidTag");
    assert_eq!(body["warnings"], json!([]));
}

#[tokio::test]
async fn test_validate_sidecar_endpoint() {
    let app = router();
    let (status, body) = send(
        &app,
        post_json(
            "/validate/sidecar",
            json!({
                "filePath": "/data/task_events.json",
                "hedVersion": "8.4.0",
                "fileData": "{\"trial_type\": {\"HED\": {\"go\": \"Press\"}}}"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"], json!([]));
    let parsed: Value = serde_json::from_str(body["parsedHedSidecar"].as_str().unwrap()).unwrap();
    assert_eq!(parsed["trial_type"]["HED"]["go"], "Press");
}

#[tokio::test]
async fn test_validate_tsv_endpoint() {
    let app = router();
    let (status, body) = send(
        &app,
        post_json(
            "/validate/tsv",
            json!({
                "filePath": "/data/task_events.tsv",
                "hedVersion": "8.4.0",
                "fileData": "onset\tHED\n1.0\tRed/Crimson\n"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"][0]["code"], "TAG_EXTENSION_INVALID");
    assert_eq!(body["errors"][0]["line"], "2");
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let app = router();
    let request = Request::builder()
        .method("POST")
        .uri("/validate/string")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert!(status.is_client_error());

    let (status, _) = send(&app, post_json("/validate/string", json!({"hedVersion": "8.4.0"}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_schema_cache_endpoints() {
    let app = router();
    send(
        &app,
        post_json("/validate/string", json!({"hedString": "Red", "hedVersion": " 8.4.0 "})),
    )
    .await;

    let (status, stats) = send(&app, empty("GET", "/schemas")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["size"], 1);
    assert_eq!(stats["keys"], json!(["8.4.0"]));
    assert_eq!(stats["misses"], 1);

    let (_, evicted) = send(&app, empty("DELETE", "/schemas/8.4.0")).await;
    assert_eq!(evicted["version"], "8.4.0");
    assert_eq!(evicted["removed"], true);

    let (_, again) = send(&app, empty("DELETE", "/schemas/8.4.0")).await;
    assert_eq!(again["removed"], false);

    send(
        &app,
        post_json("/validate/string", json!({"hedString": "Red", "hedVersion": "8.4.0"})),
    )
    .await;
    let (_, cleared) = send(&app, empty("DELETE", "/schemas")).await;
    assert_eq!(cleared["size"], 0);
}
