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

//! Error types for schema loading and validation.

use crate::issue::Issue;
use thiserror::Error;

/// Errors raised while resolving a schema version specification into
/// loaded schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The version specification could not be parsed.
    #[error("invalid HED schema version specification '{0}'")]
    InvalidVersion(String),

    /// Two schemas in one specification share a namespace prefix.
    #[error("duplicate HED schema prefix '{0}'")]
    DuplicatePrefix(String),

    /// No schema file exists for a requested version.
    #[error("HED schema file not found: {0}")]
    NotFound(String),

    /// The schema file exists but could not be read.
    #[error("failed to read HED schema {path}: {message}")]
    Io {
        /// Path of the schema file.
        path: String,
        /// Underlying error message.
        message: String,
    },

    /// The schema XML is malformed.
    #[error("malformed HED schema XML at position {pos}: {message}")]
    Xml {
        /// Byte offset where the parser failed.
        pos: usize,
        /// Parser message.
        message: String,
    },

    /// The schema XML parsed but defines no tags.
    #[error("HED schema '{0}' defines no tags")]
    Empty(String),
}

/// A validation failure raised as an error rather than returned as an issue.
///
/// Carries the structured issue that caused it when one is available.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct IssueError {
    /// Human-readable message.
    pub message: String,
    /// The issue behind the failure, if any.
    pub issue: Option<Issue>,
}

impl IssueError {
    /// Wrap a structured issue.
    pub fn new(issue: Issue) -> Self {
        Self {
            message: issue.message.clone(),
            issue: Some(issue),
        }
    }

    /// Create an error that carries no structured issue.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            issue: None,
        }
    }
}
