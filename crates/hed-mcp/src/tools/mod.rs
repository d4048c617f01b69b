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

//! HED tools for the MCP and HTTP servers.
//!
//! Available tools:
//! - `validateHedString`: Validate a standalone HED annotation
//! - `validateHedTsv`: Validate the HED content of a BIDS TSV file
//! - `validateHedSidecar`: Validate a BIDS JSON sidecar
//! - `getFileFromPath`: Read a file by absolute path

mod file_ops;
mod helpers;
#[macro_use]
mod schema_macros;
mod types;
mod validation;

pub use file_ops::get_file_from_path;
pub use helpers::parse_args;
pub use types::{
    FileContentResult, GetFileArgs, SidecarData, SidecarValidationResult, ToolOutput,
    ValidateSidecarArgs, ValidateStringArgs, ValidateTsvArgs, ValidationResult, MAX_INPUT_SIZE,
};
pub use validation::{validate_hed_sidecar, validate_hed_string, validate_hed_tsv};

use crate::backend::{FileReader, FsReader, HedBackend, LocalBackend};
use crate::error::{McpError, McpResult};
use crate::protocol::{CallToolResult, Tool};
use crate::schema_cache::SchemaCache;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Collaborators shared by every tool call.
///
/// One instance is built at startup and shared by all transports, so the
/// schema cache is process-wide.
#[derive(Clone)]
pub struct ToolContext {
    pub cache: Arc<SchemaCache>,
    pub backend: Arc<dyn HedBackend>,
    pub reader: Arc<dyn FileReader>,
}

impl ToolContext {
    /// Local validator reading schema XML from `schema_dir`.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        let backend = Arc::new(LocalBackend::new(schema_dir));
        Self {
            cache: Arc::new(SchemaCache::new(backend.clone())),
            backend,
            reader: Arc::new(FsReader),
        }
    }

    pub fn with_parts(
        cache: Arc<SchemaCache>,
        backend: Arc<dyn HedBackend>,
        reader: Arc<dyn FileReader>,
    ) -> Self {
        Self {
            cache,
            backend,
            reader,
        }
    }
}

/// Get all available tools.
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "validateHedString".to_string(),
            description: "Validate a HED annotation string against a HED schema version. Returns errors, and warnings when requested.".to_string(),
            input_schema: tool_schema! {
                required: ["hedString", "hedVersion"],
                properties: {
                    hedString: schema_string!("HED annotation to validate, e.g. \"Sensory-event, Red\""),
                    hedVersion: hed_version_arg!(),
                    checkForWarnings: check_warnings_arg!(),
                    definitions: definitions_arg!()
                }
            },
        },
        Tool {
            name: "validateHedTsv".to_string(),
            description: "Validate the HED annotations of a BIDS TSV file, optionally with its JSON sidecar.".to_string(),
            input_schema: tool_schema! {
                required: ["filePath", "hedVersion"],
                properties: {
                    filePath: file_path_arg!("Absolute path of the TSV file"),
                    hedVersion: hed_version_arg!(),
                    checkForWarnings: check_warnings_arg!(),
                    fileData: schema_string!("TSV text to validate instead of reading filePath"),
                    jsonData: schema_string!("Sidecar JSON text applying to the TSV columns"),
                    definitions: definitions_arg!()
                }
            },
        },
        Tool {
            name: "validateHedSidecar".to_string(),
            description: "Validate a BIDS JSON sidecar and return its HED-bearing columns.".to_string(),
            input_schema: tool_schema! {
                required: ["filePath", "hedVersion"],
                properties: {
                    filePath: file_path_arg!("Absolute path of the sidecar file"),
                    hedVersion: hed_version_arg!(),
                    checkForWarnings: check_warnings_arg!(),
                    fileData: schema_string_or_object!("Sidecar JSON, as text or an object, used instead of reading filePath")
                }
            },
        },
        Tool {
            name: "getFileFromPath".to_string(),
            description: "Read a text file by absolute path.".to_string(),
            input_schema: tool_schema! {
                required: ["filePath"],
                properties: {
                    filePath: file_path_arg!()
                }
            },
        },
    ]
}

/// Execute a tool by name.
///
/// Only unknown tools and malformed arguments fail; every other problem is
/// reported inside the result with `isError` set.
pub async fn execute_tool(
    ctx: &ToolContext,
    name: &str,
    arguments: Option<JsonValue>,
) -> McpResult<CallToolResult> {
    debug!(tool = name, "Executing tool");
    match name {
        "validateHedString" => respond(validate_hed_string(ctx, parse_args(arguments)?).await),
        "validateHedTsv" => respond(validate_hed_tsv(ctx, parse_args(arguments)?).await),
        "validateHedSidecar" => respond(validate_hed_sidecar(ctx, parse_args(arguments)?).await),
        "getFileFromPath" => respond(get_file_from_path(ctx, parse_args(arguments)?).await),
        _ => Err(McpError::ToolNotFound(name.to_string())),
    }
}

fn respond<T: ToolOutput>(output: T) -> McpResult<CallToolResult> {
    Ok(CallToolResult::text(
        serde_json::to_string_pretty(&output)?,
        output.has_errors(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Content;
    use serde_json::json;
    use std::path::Path;

    fn ctx() -> ToolContext {
        ToolContext::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas"))
    }

    fn text(result: &CallToolResult) -> JsonValue {
        let Content::Text { text } = &result.content[0];
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_get_tools_returns_all_tools() {
        let tools = get_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["validateHedString", "validateHedTsv", "validateHedSidecar", "getFileFromPath"]
        );
    }

    #[test]
    fn test_tool_schemas_valid() {
        for tool in get_tools() {
            assert!(!tool.description.is_empty(), "Tool {} has empty description", tool.name);
            assert_eq!(tool.input_schema["type"], "object", "Tool {}", tool.name);
            let required = tool.input_schema["required"].as_array().unwrap();
            for field in required {
                let field = field.as_str().unwrap();
                assert!(
                    tool.input_schema["properties"].get(field).is_some(),
                    "Tool {} requires undeclared {}",
                    tool.name,
                    field
                );
            }
        }
    }

    #[tokio::test]
    async fn test_execute_tool_unknown() {
        let result = execute_tool(&ctx(), "unknown_tool", None).await;
        match result {
            Err(McpError::ToolNotFound(name)) => assert_eq!(name, "unknown_tool"),
            other => panic!("Expected ToolNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_tool_bad_arguments() {
        let result = execute_tool(&ctx(), "validateHedString", Some(json!({"hedString": 3}))).await;
        assert!(matches!(result, Err(McpError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn test_execute_tool_reports_errors_in_result() {
        let args = json!({"hedString": "InvalidTag", "hedVersion": "8.4.0"});
        let result = execute_tool(&ctx(), "validateHedString", Some(args)).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        let body = text(&result);
        assert_eq!(body["errors"][0]["code"], "TAG_INVALID");
        assert_eq!(body["warnings"], json!([]));
    }

    #[tokio::test]
    async fn test_execute_tool_clean_pass() {
        let args = json!({"hedString": "Sensory-event, Red", "hedVersion": "8.4.0"});
        let result = execute_tool(&ctx(), "validateHedString", Some(args)).await.unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text(&result), json!({"errors": [], "warnings": []}));
    }
}
