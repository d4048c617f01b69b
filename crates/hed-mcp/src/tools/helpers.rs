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

//! Helper functions shared across tools.

use crate::error::{McpError, McpResult, ToolError};
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Parse JSON arguments into a typed structure.
pub fn parse_args<T: for<'de> Deserialize<'de>>(args: Option<JsonValue>) -> McpResult<T> {
    let args = args.unwrap_or(JsonValue::Object(serde_json::Map::new()));
    serde_json::from_value(args).map_err(|e| McpError::InvalidArguments(e.to_string()))
}

/// Validate input size to prevent memory exhaustion.
pub fn validate_input_size(input: &str, max_size: usize) -> Result<(), ToolError> {
    if input.len() > max_size {
        return Err(ToolError::InputTooLarge {
            size: input.len(),
            max: max_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_args_valid() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        #[serde(rename_all = "camelCase")]
        struct TestArgs {
            hed_version: String,
            check_for_warnings: bool,
        }

        let args = json!({ "hedVersion": "8.4.0", "checkForWarnings": true });
        let parsed: TestArgs = parse_args(Some(args)).unwrap();

        assert_eq!(parsed.hed_version, "8.4.0");
        assert!(parsed.check_for_warnings);
    }

    #[test]
    fn test_parse_args_missing_required() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct TestArgs {
            required_field: String,
        }

        let result: McpResult<TestArgs> = parse_args(Some(json!({})));
        assert!(matches!(result, Err(McpError::InvalidArguments(_))));
    }

    #[test]
    fn test_parse_args_none() {
        #[derive(Debug, serde::Deserialize, Default)]
        struct TestArgs {
            #[serde(default)]
            optional: String,
        }

        let parsed: TestArgs = parse_args(None).unwrap();
        assert_eq!(parsed.optional, "");
    }

    #[test]
    fn test_validate_input_size() {
        assert!(validate_input_size("small input", 1024).is_ok());

        let input = "x".repeat(1000);
        let err = validate_input_size(&input, 100).unwrap_err();
        assert_eq!(err.code(), "INPUT_TOO_LARGE");
    }
}
