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

//! Declarative macros for tool input schemas.
//!
//! ```text
//! let schema = tool_schema! {
//!     required: ["hedString", "hedVersion"],
//!     properties: {
//!         hedString: schema_string!("HED annotation to validate"),
//!         hedVersion: hed_version_arg!(),
//!         checkForWarnings: check_warnings_arg!()
//!     }
//! };
//! ```

/// JSON schema for a string argument.
///
/// ```text
/// schema_string!("Description of the string field")
/// schema_string!("File path", pattern: r"^/")
/// ```
#[macro_export]
macro_rules! schema_string {
    ($description:expr) => {
        serde_json::json!({
            "type": "string",
            "description": $description
        })
    };
    ($description:expr, pattern: $pattern:expr) => {
        serde_json::json!({
            "type": "string",
            "description": $description,
            "pattern": $pattern
        })
    };
}

/// JSON schema for a boolean argument with optional default.
#[macro_export]
macro_rules! schema_bool {
    ($description:expr) => {
        serde_json::json!({
            "type": "boolean",
            "description": $description
        })
    };
    ($description:expr, default: $default:expr) => {
        serde_json::json!({
            "type": "boolean",
            "description": $description,
            "default": $default
        })
    };
}

/// JSON schema for an array of strings.
#[macro_export]
macro_rules! schema_string_array {
    ($description:expr) => {
        serde_json::json!({
            "type": "array",
            "items": { "type": "string" },
            "description": $description
        })
    };
}

/// JSON schema accepting either JSON text or an already parsed object.
#[macro_export]
macro_rules! schema_string_or_object {
    ($description:expr) => {
        serde_json::json!({
            "oneOf": [
                { "type": "string" },
                { "type": "object" }
            ],
            "description": $description
        })
    };
}

/// Complete tool input schema.
///
/// Property names are taken verbatim from the identifiers, so camelCase
/// wire names are written as camelCase identifiers.
#[macro_export]
macro_rules! tool_schema {
    (
        required: [$($req:expr),* $(,)?],
        properties: {
            $($field:ident: $schema:expr),+ $(,)?
        }
    ) => {
        serde_json::json!({
            "type": "object",
            "properties": {
                $(stringify!($field): $schema),+
            },
            "required": [$($req),*]
        })
    };
}

/// `hedVersion` argument.
#[macro_export]
macro_rules! hed_version_arg {
    () => {
        $crate::schema_string!(
            "HED schema version specification, e.g. \"8.4.0\" or \"8.4.0, sc:score_2.0.0\""
        )
    };
}

/// `checkForWarnings` argument.
#[macro_export]
macro_rules! check_warnings_arg {
    () => {
        $crate::schema_bool!("Also return warnings", default: false)
    };
}

/// `definitions` argument.
#[macro_export]
macro_rules! definitions_arg {
    () => {
        $crate::schema_string_array!(
            "Definition strings of the form (Definition/Name, (tags)) available to Def/ references"
        )
    };
}

/// `filePath` argument.
#[macro_export]
macro_rules! file_path_arg {
    () => {
        $crate::schema_string!("Absolute path of the file")
    };
    ($description:expr) => {
        $crate::schema_string!($description)
    };
}
