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

//! Issue normalization.
//!
//! The validator reports problems in several shapes depending on the call
//! path. [`RawIssue`] names each shape; [`format_issue`] flattens any of
//! them into a [`FormattedIssue`], the one record tool results carry.
//!
//! Every field of a formatted issue is a string. Unknown fields are empty,
//! never absent.

use crate::error::ToolError;
use hed_validator::{
    FileIssue, Issue, IssueError, TsvIssue, PARAM_FILE_PATH, PARAM_SIDECAR_KEY, PARAM_TSV_LINE,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Write as _};

/// Code for failures that are not validation issues.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Default code for file-scoped issues without one.
pub const FILE_VALIDATION_ERROR: &str = "FILE_VALIDATION_ERROR";

/// Severity of errors.
pub const SEVERITY_ERROR: &str = "error";

/// The uniform issue record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedIssue {
    pub code: String,
    pub detailed_code: String,
    pub severity: String,
    pub message: String,
    pub column: String,
    pub line: String,
    pub location: String,
}

impl FormattedIssue {
    /// An error-severity record with the generic internal code.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(INTERNAL_ERROR, message)
    }

    /// An error-severity record with the given code.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity: SEVERITY_ERROR.to_string(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Convert a handler failure into the single error it reports.
    pub fn from_tool_error(err: ToolError) -> Self {
        match err {
            ToolError::Validation(inner) => format_issue(&RawIssue::Wrapped(inner)),
            other => Self::error(other.code(), other.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == SEVERITY_ERROR
    }
}

/// An issue as produced by the validator, before normalization.
pub enum RawIssue {
    /// Plain message.
    Text(String),
    /// Validation failure raised as an error.
    Wrapped(IssueError),
    /// Coded issue with a parameter bag.
    Structured(Issue),
    /// Issue scoped to a file, possibly wrapping a structured issue.
    File(FileIssue),
    /// Any other JSON object.
    Record(Map<String, Value>),
    /// Any other JSON value.
    Value(Value),
    /// Anything else that can describe itself.
    Opaque(Box<dyn fmt::Display + Send + Sync>),
}

impl fmt::Debug for RawIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Wrapped(err) => f.debug_tuple("Wrapped").field(err).finish(),
            Self::Structured(issue) => f.debug_tuple("Structured").field(issue).finish(),
            Self::File(issue) => f.debug_tuple("File").field(issue).finish(),
            Self::Record(map) => f.debug_tuple("Record").field(map).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl RawIssue {
    /// Classify untyped JSON.
    ///
    /// Objects that deserialize as a structured or file-scoped issue become
    /// that variant; other objects are records.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(map) => {
                if map.contains_key("hedCode") {
                    if let Ok(issue) = serde_json::from_value::<Issue>(Value::Object(map.clone())) {
                        return Self::Structured(issue);
                    }
                }
                if map.contains_key("filePath") && (map.contains_key("issue") || map.contains_key("code")) {
                    if let Ok(issue) = serde_json::from_value::<FileIssue>(Value::Object(map.clone())) {
                        return Self::File(issue);
                    }
                }
                Self::Record(map)
            }
            other => Self::Value(other),
        }
    }
}

impl From<Issue> for RawIssue {
    fn from(issue: Issue) -> Self {
        Self::Structured(issue)
    }
}

impl From<FileIssue> for RawIssue {
    fn from(issue: FileIssue) -> Self {
        Self::File(issue)
    }
}

impl From<IssueError> for RawIssue {
    fn from(err: IssueError) -> Self {
        Self::Wrapped(err)
    }
}

impl From<TsvIssue> for RawIssue {
    fn from(issue: TsvIssue) -> Self {
        match issue {
            TsvIssue::Hed(issue) => Self::Structured(issue),
            TsvIssue::File(issue) => Self::File(issue),
        }
    }
}

impl From<String> for RawIssue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawIssue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for RawIssue {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// Flatten one issue.
pub fn format_issue(issue: &RawIssue) -> FormattedIssue {
    match issue {
        RawIssue::Text(text) => FormattedIssue::internal(text.clone()),
        RawIssue::Wrapped(err) => match &err.issue {
            Some(inner) => format_structured(inner),
            None => FormattedIssue::internal(err.message.clone()),
        },
        RawIssue::Structured(inner) => format_structured(inner),
        RawIssue::File(file) => format_file(file),
        RawIssue::Record(map) => format_record(map),
        RawIssue::Value(Value::String(text)) => FormattedIssue::internal(text.clone()),
        RawIssue::Value(value) => FormattedIssue::internal(stringify(value)),
        RawIssue::Opaque(display) => FormattedIssue::internal(stringify(display)),
    }
}

/// Flatten a list of issues, keeping their order.
pub fn format_issues(issues: &[RawIssue]) -> Vec<FormattedIssue> {
    issues.iter().map(format_issue).collect()
}

/// Flatten anything convertible into raw issues.
pub fn format_all<T: Into<RawIssue>>(issues: impl IntoIterator<Item = T>) -> Vec<FormattedIssue> {
    issues
        .into_iter()
        .map(|issue| format_issue(&issue.into()))
        .collect()
}

/// Errors and everything else, each in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeverityPartition {
    pub errors: Vec<FormattedIssue>,
    pub others: Vec<FormattedIssue>,
}

/// Split issues by whether their severity is exactly `"error"`.
pub fn partition_by_severity(issues: Vec<FormattedIssue>) -> SeverityPartition {
    let (errors, others) = issues.into_iter().partition(FormattedIssue::is_error);
    SeverityPartition { errors, others }
}

fn format_structured(issue: &Issue) -> FormattedIssue {
    FormattedIssue {
        code: issue.hed_code.clone(),
        detailed_code: issue.internal_code.clone(),
        severity: issue.level.to_string(),
        message: issue.message.clone(),
        column: issue.parameter(PARAM_SIDECAR_KEY).unwrap_or_default().to_string(),
        line: issue.parameter(PARAM_TSV_LINE).unwrap_or_default().to_string(),
        location: issue.parameter(PARAM_FILE_PATH).unwrap_or_default().to_string(),
    }
}

fn format_file(file: &FileIssue) -> FormattedIssue {
    let inner = file.issue.as_ref().map(format_structured).unwrap_or_default();
    let or_inner = |own: Option<String>, fallback: String| own.filter(|s| !s.is_empty()).unwrap_or(fallback);

    let code = or_inner(file.code.clone(), inner.code);
    let severity = or_inner(file.level.map(|l| l.to_string()), inner.severity);
    FormattedIssue {
        code: if code.is_empty() { FILE_VALIDATION_ERROR.to_string() } else { code },
        detailed_code: inner.detailed_code,
        severity: if severity.is_empty() { SEVERITY_ERROR.to_string() } else { severity },
        message: or_inner(file.message.clone(), inner.message),
        column: inner.column,
        line: or_inner(file.line.map(|l| l.to_string()), inner.line),
        location: or_inner(Some(file.file_path.clone()), inner.location),
    }
}

fn format_record(map: &Map<String, Value>) -> FormattedIssue {
    let pick = |keys: &[&str]| {
        keys.iter()
            .filter_map(|key| map.get(*key))
            .find(|value| !value.is_null())
            .map(value_text)
            .unwrap_or_default()
    };

    let code = pick(&["type", "code"]).to_uppercase();
    let severity = pick(&["level", "severity"]);
    FormattedIssue {
        code: if code.is_empty() { INTERNAL_ERROR.to_string() } else { code },
        detailed_code: pick(&["subCode", "internalCode"]),
        severity: if severity.is_empty() { SEVERITY_ERROR.to_string() } else { severity },
        message: pick(&["message", "msg", "description"]),
        column: pick(&["column", "columnNumber", "sidecarKey"]),
        line: pick(&["line", "tsvLine", "lineNumber"]),
        location: pick(&["filePath"]),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Generic string conversion. A failing `Display` yields `UNKNOWN: <reason>`.
fn stringify(value: &dyn fmt::Display) -> String {
    let mut out = String::new();
    match write!(out, "{}", value) {
        Ok(()) => out,
        Err(err) => format!("UNKNOWN: {}", err),
    }
}
