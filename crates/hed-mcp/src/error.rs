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

//! Error types for the MCP server and the tool handlers.

use hed_validator::{IssueError, SchemaError};
use thiserror::Error;

/// MCP server error type.
///
/// These surface as JSON-RPC errors. Failures inside a tool are reported
/// through [`ToolError`] instead and never reach the protocol layer.
#[derive(Error, Debug)]
pub enum McpError {
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Tool not found.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Result type for MCP operations.
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// Get the JSON-RPC error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Json(_) => -32700,
            Self::Io(_) => -32002,
            Self::InvalidRequest(_) => -32600,
            Self::ToolNotFound(_) => -32601,
            Self::InvalidArguments(_) => -32602,
        }
    }
}

/// Failure of the file-read collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileReadError {
    /// Paths must be absolute.
    #[error("File path must be absolute: {0}")]
    NotAbsolute(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },
}

/// Failure inside a tool handler.
///
/// Every variant is turned into a single formatted error at the handler
/// boundary; see [`crate::issues::FormattedIssue::from_tool_error`].
#[derive(Error, Debug)]
pub enum ToolError {
    /// The schema version could not be resolved or loaded.
    #[error("Failed to load HED schema: {0}")]
    SchemaLoad(#[from] SchemaError),

    #[error(transparent)]
    File(#[from] FileReadError),

    /// Inline or file JSON is malformed.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The validator rejected its input outright.
    #[error(transparent)]
    Validation(#[from] IssueError),

    /// Input exceeds the accepted size.
    #[error("Input size exceeds maximum: {size} bytes (max: {max} bytes)")]
    InputTooLarge { size: usize, max: usize },

    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    /// Stable issue code reported for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaLoad(_) => "SCHEMA_LOAD_FAILED",
            Self::File(FileReadError::NotAbsolute(_)) => "INVALID_FILE_PATH",
            Self::File(FileReadError::NotFound(_)) => "FILE_NOT_FOUND",
            Self::File(FileReadError::Io { .. }) => "FILE_READ_ERROR",
            Self::Json(_) => "JSON_PARSE_ERROR",
            Self::Validation(_) => "INTERNAL_ERROR",
            Self::InputTooLarge { .. } => "INPUT_TOO_LARGE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
