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

//! Validation issues produced by the validator.
//!
//! An [`Issue`] carries a stable HED code (e.g. `TAG_INVALID`), a finer
//! internal code, a severity, a message and a bag of string parameters.
//! Location information travels in the parameters:
//!
//! - `tsvLine`: 1-based line in a TSV file (the header is line 1)
//! - `sidecarKey`: the sidecar column the issue belongs to
//! - `filePath`: path of the file being validated

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter key for TSV line numbers.
pub const PARAM_TSV_LINE: &str = "tsvLine";
/// Parameter key for sidecar column names.
pub const PARAM_SIDECAR_KEY: &str = "sidecarKey";
/// Parameter key for file paths.
pub const PARAM_FILE_PATH: &str = "filePath";
/// Parameter key for the offending tag.
pub const PARAM_TAG: &str = "tag";

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Lowercase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Stable HED error category.
    pub hed_code: String,
    /// Finer-grained validator code.
    pub internal_code: String,
    /// Severity level.
    pub level: Severity,
    /// Human-readable message.
    pub message: String,
    /// Context parameters (line, column, file, tag).
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Issue {
    /// Create an error-level issue.
    pub fn error(
        hed_code: impl Into<String>,
        internal_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            hed_code: hed_code.into(),
            internal_code: internal_code.into(),
            level: Severity::Error,
            message: message.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Create a warning-level issue.
    pub fn warning(
        hed_code: impl Into<String>,
        internal_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level: Severity::Warning,
            ..Self::error(hed_code, internal_code, message)
        }
    }

    /// Attach a context parameter.
    pub fn with_parameter(mut self, key: &str, value: impl ToString) -> Self {
        self.parameters.insert(key.to_string(), value.to_string());
        self
    }

    /// Look up a context parameter.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.level == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.level, self.hed_code, self.message)
    }
}

/// An issue scoped to a file, optionally wrapping a structured issue.
///
/// The wrapper's own fields take precedence over the inner issue's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIssue {
    /// Path of the file the issue belongs to.
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
}

impl FileIssue {
    /// Wrap a structured issue with file context.
    pub fn wrap(file_path: impl Into<String>, issue: Issue) -> Self {
        Self {
            file_path: file_path.into(),
            code: None,
            line: None,
            level: None,
            message: None,
            issue: Some(issue),
        }
    }

    /// Set the line the issue refers to.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Issue produced while validating a TSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsvIssue {
    /// A HED issue found in a row or the attached sidecar.
    Hed(Issue),
    /// A structural problem with the file itself.
    File(FileIssue),
}

impl TsvIssue {
    pub fn is_error(&self) -> bool {
        match self {
            Self::Hed(issue) => issue.is_error(),
            Self::File(file) => file
                .level
                .or_else(|| file.issue.as_ref().map(|i| i.level))
                .map_or(true, |level| level == Severity::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_parameters() {
        let issue = Issue::error("TAG_INVALID", "invalidTag", "bad")
            .with_parameter(PARAM_TSV_LINE, 3)
            .with_parameter(PARAM_TAG, "Foo");

        assert_eq!(issue.parameter(PARAM_TSV_LINE), Some("3"));
        assert_eq!(issue.parameter(PARAM_TAG), Some("Foo"));
        assert_eq!(issue.parameter(PARAM_SIDECAR_KEY), None);
        assert!(issue.is_error());
    }

    #[test]
    fn test_warning_level() {
        let issue = Issue::warning("TAG_EXTENDED", "extension", "extended");
        assert_eq!(issue.level, Severity::Warning);
        assert!(!issue.is_error());
        assert_eq!(issue.to_string(), "warning [TAG_EXTENDED]: extended");
    }

    #[test]
    fn test_issue_serializes_camel_case() {
        let issue = Issue::error("TAG_INVALID", "invalidTag", "bad");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["hedCode"], "TAG_INVALID");
        assert_eq!(json["internalCode"], "invalidTag");
        assert_eq!(json["level"], "error");
    }

    #[test]
    fn test_tsv_file_issue_severity() {
        let bare = TsvIssue::File(FileIssue {
            file_path: "a.tsv".to_string(),
            code: Some("TSV_INVALID".to_string()),
            line: Some(2),
            level: None,
            message: Some("short row".to_string()),
            issue: None,
        });
        assert!(bare.is_error());

        let wrapped = TsvIssue::File(FileIssue::wrap(
            "a.tsv",
            Issue::warning("TAG_EXTENDED", "extension", "x"),
        ));
        assert!(!wrapped.is_error());
    }
}
