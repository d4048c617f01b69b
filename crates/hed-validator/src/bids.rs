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

//! BIDS sidecar and TSV validation.
//!
//! A JSON sidecar annotates the columns of a BIDS events file. Columns with
//! a `HED` entry are either value columns (a single string with one `#`
//! placeholder that is replaced by the cell value) or categorical columns
//! (an object mapping cell values to HED strings):
//!
//! ```json
//! {
//!   "duration": { "HED": "Duration/# s" },
//!   "trial_type": { "HED": { "go": "Sensory-event, Red", "stop": "Agent-action" } }
//! }
//! ```
//!
//! Each TSV row is annotated by joining the HED strings of its sidecar
//! columns with the contents of an optional `HED` column.

use crate::definitions::{definition_from, Definition, DefinitionManager};
use crate::error::IssueError;
use crate::issue::{FileIssue, Issue, Severity, TsvIssue, PARAM_FILE_PATH, PARAM_SIDECAR_KEY, PARAM_TSV_LINE};
use crate::schema::Schemas;
use crate::string::{parse_hed_string, parse_standalone_hed_string, HedNode, ParseOptions, ParsedHedString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the TSV column holding inline HED annotations.
pub const HED_COLUMN: &str = "HED";

/// Cell value marking a missing entry.
const NOT_APPLICABLE: &str = "n/a";

/// File context of a validated BIDS file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BidsFile {
    /// File name, e.g. `task-go_events.tsv`.
    pub name: String,
    /// Path the file was read from, or the caller-supplied path for inline data.
    pub path: String,
}

impl BidsFile {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build the file context from a path, using its last component as name.
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
        Self::new(name, path)
    }
}

/// HED annotation of one sidecar column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarColumn {
    /// A template with one `#` placeholder.
    Value(String),
    /// HED strings keyed by cell value.
    Categorical(BTreeMap<String, String>),
}

/// A parsed JSON sidecar.
#[derive(Debug, Clone)]
pub struct BidsSidecar {
    name: String,
    file: BidsFile,
    columns: BTreeMap<String, SidecarColumn>,
    structure_issues: Vec<Issue>,
}

impl BidsSidecar {
    /// Build a sidecar from parsed JSON.
    ///
    /// Fails when the document is not a JSON object. Columns whose `HED`
    /// entry has the wrong shape are reported by [`validate`](Self::validate).
    pub fn new(name: impl Into<String>, file: BidsFile, json: Value) -> Result<Self, IssueError> {
        let Value::Object(entries) = json else {
            return Err(IssueError::new(
                Issue::error(
                    "SIDECAR_INVALID",
                    "invalidJson",
                    "Sidecar must be a JSON object",
                )
                .with_parameter(PARAM_FILE_PATH, &file.path),
            ));
        };

        let mut columns = BTreeMap::new();
        let mut structure_issues = Vec::new();
        for (column, entry) in entries {
            let Some(hed) = entry.get(HED_COLUMN) else {
                continue;
            };
            match hed {
                Value::String(template) => {
                    columns.insert(column, SidecarColumn::Value(template.clone()));
                }
                Value::Object(categories) => {
                    let mut map = BTreeMap::new();
                    for (category, value) in categories {
                        match value {
                            Value::String(text) => {
                                map.insert(category.clone(), text.clone());
                            }
                            _ => structure_issues.push(
                                Issue::error(
                                    "SIDECAR_INVALID",
                                    "invalidCategory",
                                    format!(
                                        "HED entry for category '{}' of column '{}' must be a string",
                                        category, column
                                    ),
                                )
                                .with_parameter(PARAM_SIDECAR_KEY, &column)
                                .with_parameter(PARAM_FILE_PATH, &file.path),
                            ),
                        }
                    }
                    columns.insert(column, SidecarColumn::Categorical(map));
                }
                _ => structure_issues.push(
                    Issue::error(
                        "SIDECAR_INVALID",
                        "invalidHedEntry",
                        format!("HED entry of column '{}' must be a string or an object", column),
                    )
                    .with_parameter(PARAM_SIDECAR_KEY, &column)
                    .with_parameter(PARAM_FILE_PATH, &file.path),
                ),
            }
        }

        Ok(Self {
            name: name.into(),
            file,
            columns,
            structure_issues,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &BidsFile {
        &self.file
    }

    /// Columns carrying HED annotations.
    pub fn hed_columns(&self) -> &BTreeMap<String, SidecarColumn> {
        &self.columns
    }

    pub fn has_hed_data(&self) -> bool {
        !self.columns.is_empty()
    }

    /// The HED-bearing part of the sidecar as compact JSON.
    pub fn hed_data_json(&self) -> String {
        let mut out = Map::new();
        for (column, annotation) in &self.columns {
            let hed = match annotation {
                SidecarColumn::Value(template) => Value::String(template.clone()),
                SidecarColumn::Categorical(map) => Value::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                ),
            };
            let mut entry = Map::new();
            entry.insert(HED_COLUMN.to_string(), hed);
            out.insert(column.clone(), Value::Object(entry));
        }
        Value::Object(out).to_string()
    }

    /// Every HED string in the sidecar as `(column, is_value_column, text)`.
    fn strings(&self) -> Vec<(&str, bool, &str)> {
        let mut out = Vec::new();
        for (column, annotation) in &self.columns {
            match annotation {
                SidecarColumn::Value(template) => out.push((column.as_str(), true, template.as_str())),
                SidecarColumn::Categorical(map) => {
                    out.extend(map.values().map(|text| (column.as_str(), false, text.as_str())))
                }
            }
        }
        out
    }

    fn locate(&self, issue: Issue, column: Option<&str>) -> Issue {
        let issue = issue.with_parameter(PARAM_FILE_PATH, &self.file.path);
        match column {
            Some(column) => issue.with_parameter(PARAM_SIDECAR_KEY, column),
            None => issue,
        }
    }

    /// Extract the definitions declared in the sidecar.
    ///
    /// Strings with tag errors are skipped here; [`validate`](Self::validate)
    /// reports those. Malformed definition groups are returned as issues.
    pub fn collect_definitions(&self, schemas: &Schemas) -> (Vec<Definition>, Vec<Issue>) {
        let options = ParseOptions {
            definitions_allowed: true,
            placeholders_allowed: true,
            check_def_references: false,
            definitions: None,
        };
        let mut definitions = Vec::new();
        let mut issues = Vec::new();
        for (column, _, text) in self.strings() {
            let (Some(parsed), errors, _) = parse_hed_string(text, schemas, options) else {
                continue;
            };
            if !errors.is_empty() {
                continue;
            }
            for node in &parsed.children {
                let HedNode::Group(children) = node else {
                    continue;
                };
                let declares = children
                    .iter()
                    .any(|c| matches!(c, HedNode::Tag(tag) if tag.is("Definition")));
                if !declares {
                    continue;
                }
                let group = ParsedHedString {
                    source: node.to_string(),
                    children: vec![node.clone()],
                };
                match definition_from(&group) {
                    Ok(definition) => definitions.push(definition),
                    Err(issue) => issues.push(self.locate(issue, Some(column))),
                }
            }
        }
        (definitions, issues)
    }

    /// Validate every HED string in the sidecar.
    ///
    /// Returns errors and warnings together.
    pub fn validate(&self, schemas: &Schemas) -> Vec<Issue> {
        self.check(schemas, None).0
    }

    /// Validate against the sidecar's own definitions plus an external set.
    /// Also returns the combined definitions for validating the rows the
    /// sidecar annotates.
    fn check(
        &self,
        schemas: &Schemas,
        external: Option<&DefinitionManager>,
    ) -> (Vec<Issue>, DefinitionManager) {
        let mut issues = self.structure_issues.clone();

        let (definitions, definition_issues) = self.collect_definitions(schemas);
        issues.extend(definition_issues);
        let mut manager = external.cloned().unwrap_or_default();
        for issue in manager.add_definitions(definitions) {
            issues.push(self.locate(issue, None));
        }

        for (column, is_value, text) in self.strings() {
            if is_value {
                let placeholders = text.matches('#').count();
                if placeholders != 1 {
                    issues.push(self.locate(
                        Issue::error(
                            "PLACEHOLDER_INVALID",
                            "invalidPlaceholderCount",
                            format!(
                                "Value column '{}' must contain exactly one '#', found {}",
                                column, placeholders
                            ),
                        ),
                        Some(column),
                    ));
                }
            }

            let options = ParseOptions {
                definitions_allowed: true,
                placeholders_allowed: is_value,
                check_def_references: true,
                definitions: Some(&manager),
            };
            let (_, errors, warnings) = parse_hed_string(text, schemas, options);
            for issue in errors.into_iter().chain(warnings) {
                issues.push(self.locate(issue, Some(column)));
            }
        }
        (issues, manager)
    }
}

/// A BIDS TSV file prepared for validation.
#[derive(Debug)]
pub struct BidsTsvFile<'a> {
    name: String,
    file: BidsFile,
    headers: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
    sidecar: Option<BidsSidecar>,
    load_issues: Vec<TsvIssue>,
    definitions: Option<&'a DefinitionManager>,
}

impl<'a> BidsTsvFile<'a> {
    /// Read tab-separated text, optionally with its sidecar JSON and a set
    /// of externally supplied definitions.
    ///
    /// A sidecar that is not a JSON object is recorded as a load issue and
    /// ignored. Callers that need to reject it up front should build the
    /// [`BidsSidecar`] themselves and use [`with_sidecar`](Self::with_sidecar).
    pub fn new(
        name: impl Into<String>,
        file: BidsFile,
        text: &str,
        sidecar: Option<Value>,
        definitions: Option<&'a DefinitionManager>,
    ) -> Self {
        let (sidecar, sidecar_issue) = match sidecar {
            Some(json) => match BidsSidecar::new(file.name.clone(), file.clone(), json) {
                Ok(sidecar) => (Some(sidecar), None),
                Err(err) => (
                    None,
                    Some(TsvIssue::Hed(err.issue.unwrap_or_else(|| {
                        Issue::error("SIDECAR_INVALID", "invalidJson", err.message)
                    }))),
                ),
            },
            None => (None, None),
        };

        let mut tsv = Self::with_sidecar(name, file, text, sidecar, definitions);
        if let Some(issue) = sidecar_issue {
            tsv.load_issues.insert(0, issue);
        }
        tsv
    }

    /// Read tab-separated text with an already built sidecar.
    ///
    /// Rows whose column count does not match the header are reported as
    /// file issues and excluded from validation. Line numbers are physical
    /// lines of `text`, counting blank lines.
    pub fn with_sidecar(
        name: impl Into<String>,
        file: BidsFile,
        text: &str,
        sidecar: Option<BidsSidecar>,
        definitions: Option<&'a DefinitionManager>,
    ) -> Self {
        let mut load_issues = Vec::new();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = match reader.headers() {
            Ok(record) => record.iter().map(|h| h.trim().to_string()).collect(),
            Err(err) => {
                load_issues.push(tsv_file_issue(&file, 1, format!("Unreadable header: {}", err)));
                Vec::new()
            }
        };

        let mut rows = Vec::new();
        // The reader skips blank lines, so take line numbers from its positions.
        let mut last_line = 1;
        for record in reader.records() {
            match record {
                Ok(record) => {
                    let line = record
                        .position()
                        .map_or(last_line + 1, |pos| pos.line() as usize);
                    last_line = line;
                    if record.len() == headers.len() {
                        rows.push((line, record.iter().map(|c| c.trim().to_string()).collect()));
                    } else {
                        load_issues.push(tsv_file_issue(
                            &file,
                            line,
                            format!(
                                "Row has {} columns but the header has {}",
                                record.len(),
                                headers.len()
                            ),
                        ));
                    }
                }
                Err(err) => {
                    let line = err
                        .position()
                        .map_or(last_line + 1, |pos| pos.line() as usize);
                    last_line = line;
                    load_issues.push(tsv_file_issue(&file, line, err.to_string()));
                }
            }
        }

        Self {
            name: name.into(),
            file,
            headers,
            rows,
            sidecar,
            load_issues,
            definitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Whether any column carries HED annotations, either inline or via
    /// the sidecar.
    pub fn has_hed_data(&self) -> bool {
        self.headers.iter().any(|h| {
            h == HED_COLUMN
                || self
                    .sidecar
                    .as_ref()
                    .is_some_and(|s| s.hed_columns().contains_key(h))
        })
    }

    /// Validate the sidecar and every annotated row.
    ///
    /// Returns errors and warnings together.
    pub fn validate(&self, schemas: &Schemas) -> Vec<TsvIssue> {
        let mut issues = self.load_issues.clone();

        let manager = match &self.sidecar {
            Some(sidecar) => {
                let (sidecar_issues, manager) = sidecar.check(schemas, self.definitions);
                issues.extend(sidecar_issues.into_iter().map(TsvIssue::Hed));
                manager
            }
            None => self.definitions.cloned().unwrap_or_default(),
        };

        for (line, cells) in &self.rows {
            let (text, missing) = self.assemble_row(cells);
            for (column, value) in missing {
                issues.push(TsvIssue::Hed(
                    Issue::warning(
                        "SIDECAR_KEY_MISSING",
                        "sidecarKeyMissing",
                        format!("Value '{}' of column '{}' has no HED annotation", value, column),
                    )
                    .with_parameter(PARAM_TSV_LINE, line)
                    .with_parameter(PARAM_SIDECAR_KEY, column)
                    .with_parameter(PARAM_FILE_PATH, &self.file.path),
                ));
            }
            if text.is_empty() {
                continue;
            }
            let (_, errors, warnings) = parse_standalone_hed_string(&text, schemas, Some(&manager));
            for issue in errors.into_iter().chain(warnings) {
                issues.push(TsvIssue::Hed(
                    issue
                        .with_parameter(PARAM_TSV_LINE, line)
                        .with_parameter(PARAM_FILE_PATH, &self.file.path),
                ));
            }
        }
        issues
    }

    /// Join the annotations of one row. Also returns the categorical cells
    /// that have no sidecar entry.
    fn assemble_row<'r>(&'r self, cells: &'r [String]) -> (String, Vec<(&'r str, &'r str)>) {
        let mut parts = Vec::new();
        let mut missing = Vec::new();
        for (header, cell) in self.headers.iter().zip(cells) {
            if cell.is_empty() || cell == NOT_APPLICABLE {
                continue;
            }
            if header == HED_COLUMN {
                parts.push(cell.clone());
                continue;
            }
            let annotation = self
                .sidecar
                .as_ref()
                .and_then(|s| s.hed_columns().get(header));
            match annotation {
                Some(SidecarColumn::Value(template)) => parts.push(template.replace('#', cell)),
                Some(SidecarColumn::Categorical(map)) => match map.get(cell) {
                    Some(text) if !text.trim().is_empty() => parts.push(text.clone()),
                    Some(_) => {}
                    None => missing.push((header.as_str(), cell.as_str())),
                },
                None => {}
            }
        }
        (parts.join(", "), missing)
    }
}

fn tsv_file_issue(file: &BidsFile, line: usize, message: String) -> TsvIssue {
    TsvIssue::File(FileIssue {
        file_path: file.path.clone(),
        code: Some("TSV_INVALID".to_string()),
        line: Some(line),
        level: Some(Severity::Error),
        message: Some(message),
        issue: None,
    })
}
