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

//! Argument and result types for the HED tools.

use crate::issues::FormattedIssue;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum size in bytes of any string or file a tool will validate (10 MB).
pub const MAX_INPUT_SIZE: usize = 10 * 1024 * 1024;

// ============ Argument Structures ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateStringArgs {
    pub hed_string: String,
    pub hed_version: String,
    #[serde(default)]
    pub check_for_warnings: bool,
    #[serde(default)]
    pub definitions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTsvArgs {
    pub file_path: String,
    pub hed_version: String,
    #[serde(default)]
    pub check_for_warnings: bool,
    /// Inline TSV text used instead of reading `file_path`.
    #[serde(default)]
    pub file_data: Option<String>,
    /// Inline sidecar JSON text.
    #[serde(default)]
    pub json_data: Option<String>,
    #[serde(default)]
    pub definitions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSidecarArgs {
    pub file_path: String,
    pub hed_version: String,
    #[serde(default)]
    pub check_for_warnings: bool,
    #[serde(default)]
    pub file_data: Option<SidecarData>,
}

/// Inline sidecar content: raw JSON text or an already parsed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SidecarData {
    Text(String),
    Parsed(JsonValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileArgs {
    pub file_path: String,
}

/// Inline data counts as supplied only when non-empty.
pub(crate) fn inline(data: &Option<String>) -> Option<&str> {
    data.as_deref().filter(|text| !text.is_empty())
}

// ============ Results ============

/// Tool output that reports whether it carries errors.
pub trait ToolOutput: Serialize {
    fn has_errors(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<FormattedIssue>,
    pub warnings: Vec<FormattedIssue>,
}

impl ValidationResult {
    /// Keep `warnings` only when the caller asked for them.
    pub fn new(
        errors: Vec<FormattedIssue>,
        warnings: Vec<FormattedIssue>,
        check_for_warnings: bool,
    ) -> Self {
        Self {
            errors,
            warnings: if check_for_warnings { warnings } else { Vec::new() },
        }
    }

    pub fn failure(error: FormattedIssue) -> Self {
        Self {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }
}

impl ToolOutput for ValidationResult {
    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarValidationResult {
    pub errors: Vec<FormattedIssue>,
    pub warnings: Vec<FormattedIssue>,
    /// JSON text of the sidecar's HED-bearing columns.
    pub parsed_hed_sidecar: String,
}

impl SidecarValidationResult {
    pub fn failure(error: FormattedIssue) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }
}

impl ToolOutput for SidecarValidationResult {
    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentResult {
    pub file_path: String,
    pub contents: String,
    pub errors: Vec<FormattedIssue>,
}

impl ToolOutput for FileContentResult {
    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
