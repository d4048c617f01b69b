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

//! HED definitions.
//!
//! A definition names a reusable tag group:
//!
//! ```text
//! (Definition/Go-signal, (Sensory-event, Red))
//! (Definition/Stim-duration/#, (Duration/# s))
//! ```
//!
//! Definitions are referenced from annotations with `Def/Go-signal` or
//! `Def/Stim-duration/2`.

use crate::issue::Issue;
use crate::schema::Schemas;
use crate::string::{collect_tags, parse_hed_string, HedNode, ParseOptions, ParsedHedString};
use std::collections::{BTreeMap, HashSet};

/// Parameter key naming the definition an issue refers to.
pub const PARAM_DEFINITION: &str = "definition";

/// A parsed definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    name: String,
    placeholder: bool,
    contents: Option<String>,
}

impl Definition {
    pub fn new(name: impl Into<String>, placeholder: bool, contents: Option<String>) -> Self {
        Self {
            name: name.into(),
            placeholder,
            contents,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether references must supply a `#` value.
    pub fn takes_placeholder(&self) -> bool {
        self.placeholder
    }

    /// The defined tag group as written, if any.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// The set of definitions active for one validation.
#[derive(Debug, Clone, Default)]
pub struct DefinitionManager {
    definitions: BTreeMap<String, Definition>,
}

impl DefinitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of definitions.
    ///
    /// Names are compared case-insensitively. A batch containing a name that
    /// is already registered, or that repeats within the batch, is rejected
    /// as a whole and the returned list holds one issue per conflict.
    pub fn add_definitions(&mut self, definitions: Vec<Definition>) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        for def in &definitions {
            let key = def.key();
            if self.definitions.contains_key(&key) || !seen.insert(key) {
                issues.push(
                    Issue::error(
                        "DEFINITION_INVALID",
                        "duplicateDefinition",
                        format!("Definition '{}' is defined more than once", def.name()),
                    )
                    .with_parameter(PARAM_DEFINITION, def.name()),
                );
            }
        }

        if issues.is_empty() {
            for def in definitions {
                self.definitions.insert(def.key(), def);
            }
        }
        issues
    }

    /// Look up a definition by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values()
    }
}

/// Parse a definition string.
///
/// Returns the definition (or `None` when it is malformed) together with
/// the errors and warnings found.
pub fn parse_definition_string(
    text: &str,
    schemas: &Schemas,
) -> (Option<Definition>, Vec<Issue>, Vec<Issue>) {
    let options = ParseOptions {
        definitions_allowed: true,
        placeholders_allowed: true,
        check_def_references: false,
        definitions: None,
    };
    let (parsed, mut errors, warnings) = parse_hed_string(text, schemas, options);
    let Some(parsed) = parsed else {
        return (None, errors, warnings);
    };
    if !errors.is_empty() {
        return (None, errors, warnings);
    }

    match definition_from(&parsed) {
        Ok(definition) => (Some(definition), errors, warnings),
        Err(issue) => {
            errors.push(issue.with_parameter(PARAM_DEFINITION, text));
            (None, errors, warnings)
        }
    }
}

fn invalid(internal: &str, message: String) -> Issue {
    Issue::error("DEFINITION_INVALID", internal, message)
}

pub(crate) fn definition_from(parsed: &ParsedHedString) -> Result<Definition, Issue> {
    let [HedNode::Group(children)] = parsed.children.as_slice() else {
        return Err(invalid(
            "wrongFormat",
            format!(
                "Definition must be a single parenthesized group: '{}'",
                parsed.source
            ),
        ));
    };

    let mut name_tag = None;
    let mut contents = None;
    for child in children {
        match child {
            HedNode::Tag(tag) if tag.is("Definition") => {
                if name_tag.is_some() {
                    return Err(invalid(
                        "multipleDefinitionTags",
                        format!("Definition group has more than one Definition tag: '{}'", parsed.source),
                    ));
                }
                name_tag = Some(tag);
            }
            HedNode::Group(group) => {
                if contents.is_some() {
                    return Err(invalid(
                        "multipleGroups",
                        format!("Definition has more than one inner group: '{}'", parsed.source),
                    ));
                }
                contents = Some(group);
            }
            HedNode::Tag(tag) => {
                return Err(invalid(
                    "extraTags",
                    format!("Definition contains unexpected tag '{}'", tag.original),
                ));
            }
        }
    }

    let name_tag = name_tag.ok_or_else(|| {
        invalid(
            "missingDefinitionTag",
            format!("Definition group has no Definition tag: '{}'", parsed.source),
        )
    })?;

    let value = name_tag.value.as_deref().unwrap_or_default();
    let (name, placeholder) = match value.split_once('/') {
        Some((name, "#")) => (name, true),
        Some(_) => {
            return Err(invalid(
                "invalidPlaceholder",
                format!("Definition name '{}' may only be followed by '/#'", value),
            ))
        }
        None => (value, false),
    };

    let mut placeholder_count = 0;
    if let Some(group) = contents {
        let mut tags = Vec::new();
        collect_tags(group, &mut tags);
        for tag in tags {
            if tag.is("Definition") || tag.is("Def") || tag.is("Def-expand") {
                return Err(invalid(
                    "nestedDefinition",
                    format!("Definition '{}' contains '{}'", name, tag.original),
                ));
            }
            placeholder_count += tag.value.as_deref().map_or(0, |v| v.matches('#').count());
        }
    }

    if (placeholder && placeholder_count != 1) || (!placeholder && placeholder_count != 0) {
        return Err(invalid(
            "invalidPlaceholder",
            format!(
                "Definition '{}' has {} placeholders in its contents, expected {}",
                name,
                placeholder_count,
                usize::from(placeholder)
            ),
        ));
    }

    Ok(Definition::new(
        name,
        placeholder,
        contents.map(|group| HedNode::Group(group.clone()).to_string()),
    ))
}
