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

//! HTTP REST surface over the same tools as the MCP server.
//!
//! Validation endpoints always answer 200 for a well-formed request; the
//! result body carries any errors. A malformed body is rejected by the
//! JSON extractor with a 4xx status.

use crate::schema_cache::SchemaCacheStats;
use crate::server::HedMcpConfig;
use crate::tools::{
    validate_hed_sidecar, validate_hed_string, validate_hed_tsv, SidecarValidationResult,
    ToolContext, ValidateSidecarArgs, ValidateStringArgs, ValidateTsvArgs, ValidationResult,
};
use crate::VERSION;
use axum::{
    extract::Path,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the router with all routes and middleware.
pub fn build_router(context: Arc<ToolContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/validate/string", post(validate_string))
        .route("/validate/tsv", post(validate_tsv))
        .route("/validate/sidecar", post(validate_sidecar))
        .route("/schemas", get(schema_stats).delete(clear_schemas))
        .route("/schemas/:version", delete(evict_schema))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(context))
}

/// Bind `config.bind` and serve until the listener fails.
pub async fn serve(config: &HedMcpConfig) -> std::io::Result<()> {
    let context = Arc::new(ToolContext::new(config.schema_dir.clone()));
    serve_with_context(config.bind, context).await
}

pub async fn serve_with_context(bind: SocketAddr, context: Arc<ToolContext>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "HED HTTP server listening");
    axum::serve(listener, build_router(context)).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn validate_string(
    Extension(context): Extension<Arc<ToolContext>>,
    Json(args): Json<ValidateStringArgs>,
) -> Json<ValidationResult> {
    Json(validate_hed_string(&context, args).await)
}

async fn validate_tsv(
    Extension(context): Extension<Arc<ToolContext>>,
    Json(args): Json<ValidateTsvArgs>,
) -> Json<ValidationResult> {
    Json(validate_hed_tsv(&context, args).await)
}

async fn validate_sidecar(
    Extension(context): Extension<Arc<ToolContext>>,
    Json(args): Json<ValidateSidecarArgs>,
) -> Json<SidecarValidationResult> {
    Json(validate_hed_sidecar(&context, args).await)
}

async fn schema_stats(Extension(context): Extension<Arc<ToolContext>>) -> Json<SchemaCacheStats> {
    Json(context.cache.stats())
}

async fn clear_schemas(Extension(context): Extension<Arc<ToolContext>>) -> Json<SchemaCacheStats> {
    context.cache.clear();
    Json(context.cache.stats())
}

async fn evict_schema(
    Extension(context): Extension<Arc<ToolContext>>,
    Path(version): Path<String>,
) -> Json<Value> {
    let removed = context.cache.remove(&version);
    Json(json!({ "version": version, "removed": removed }))
}
