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

//! HED string parsing and tag validation.
//!
//! A HED string is a comma-separated list of tags and parenthesized tag
//! groups. Each tag is resolved against the schema registered for its
//! namespace prefix; tags may be written in short form (`Red`), partial
//! form (`Color/Red`) or long form (`Property/Color/Red`).

use crate::definitions::DefinitionManager;
use crate::issue::{Issue, PARAM_TAG};
use crate::schema::{HedSchema, SchemaTag, Schemas};
use std::fmt;

/// Characters that may not appear anywhere in a HED string.
const INVALID_CHARACTERS: &[char] = &['[', ']', '{', '}', '~', '"'];

/// A resolved tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHedTag {
    /// Tag text as written.
    pub original: String,
    /// Namespace prefix without the colon.
    pub prefix: String,
    /// Long name of the deepest schema node matched.
    pub long_name: String,
    /// Value following a value-taking node.
    pub value: Option<String>,
    /// Extension below an extension-allowed node.
    pub extension: Option<String>,
}

impl ParsedHedTag {
    /// Short name of the matched schema node.
    pub fn base_name(&self) -> &str {
        self.long_name.rsplit('/').next().unwrap_or(&self.long_name)
    }

    pub(crate) fn is(&self, name: &str) -> bool {
        self.base_name().eq_ignore_ascii_case(name)
    }
}

/// Node of a parsed HED string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HedNode {
    Tag(ParsedHedTag),
    Group(Vec<HedNode>),
}

impl fmt::Display for HedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(&tag.original),
            Self::Group(children) => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A parsed and validated HED string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHedString {
    pub source: String,
    pub children: Vec<HedNode>,
}

impl ParsedHedString {
    /// All tags in document order, groups flattened.
    pub fn tags(&self) -> Vec<&ParsedHedTag> {
        let mut out = Vec::new();
        collect_tags(&self.children, &mut out);
        out
    }
}

pub(crate) fn collect_tags<'a>(nodes: &'a [HedNode], out: &mut Vec<&'a ParsedHedTag>) {
    for node in nodes {
        match node {
            HedNode::Tag(tag) => out.push(tag),
            HedNode::Group(children) => collect_tags(children, out),
        }
    }
}

/// Options controlling context-dependent checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions<'a> {
    /// Allow `Definition/` tags (definition strings and sidecars).
    pub definitions_allowed: bool,
    /// Allow `#` placeholders in tag values (sidecar value columns).
    pub placeholders_allowed: bool,
    /// Check `Def/` references against this manager when set.
    pub check_def_references: bool,
    pub definitions: Option<&'a DefinitionManager>,
}

/// Unresolved syntax tree produced by [`split_hed_string`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawNode {
    Tag(String),
    Group(Vec<RawNode>),
}

fn syntax_error(code: &str, internal: &str, message: String) -> Issue {
    Issue::error(code, internal, message)
}

fn flush_token(
    token: &mut String,
    closed_group: bool,
    target: &mut Vec<RawNode>,
    position: usize,
) -> Result<(), Issue> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        if !closed_group {
            return Err(syntax_error(
                "TAG_EMPTY",
                "emptyTagFound",
                format!("Empty tag at position {}", position),
            ));
        }
    } else {
        target.push(RawNode::Tag(trimmed.to_string()));
    }
    token.clear();
    Ok(())
}

/// Split a HED string into its tag/group structure.
pub(crate) fn split_hed_string(text: &str) -> Result<Vec<RawNode>, Issue> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut stack: Vec<Vec<RawNode>> = vec![Vec::new()];
    let mut token = String::new();
    let mut closed_group = false;

    for (position, ch) in text.char_indices() {
        match ch {
            '(' => {
                if !token.trim().is_empty() || closed_group {
                    return Err(syntax_error(
                        "COMMA_MISSING",
                        "commaMissing",
                        format!("Missing comma before '(' at position {}", position),
                    ));
                }
                token.clear();
                stack.push(Vec::new());
            }
            ')' => {
                if stack.len() == 1 {
                    return Err(syntax_error(
                        "PARENTHESES_MISMATCH",
                        "parentheses",
                        format!("Unmatched closing parenthesis at position {}", position),
                    ));
                }
                if let Some(current) = stack.last_mut() {
                    flush_token(&mut token, closed_group, current, position)?;
                }
                let group = stack.pop().unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.push(RawNode::Group(group));
                }
                closed_group = true;
            }
            ',' => {
                if let Some(current) = stack.last_mut() {
                    flush_token(&mut token, closed_group, current, position)?;
                }
                closed_group = false;
            }
            c if INVALID_CHARACTERS.contains(&c) => {
                return Err(syntax_error(
                    "CHARACTER_INVALID",
                    "invalidCharacter",
                    format!("Invalid character '{}' at position {}", c, position),
                ));
            }
            c => {
                if closed_group && !c.is_whitespace() {
                    return Err(syntax_error(
                        "COMMA_MISSING",
                        "commaMissing",
                        format!("Missing comma after ')' at position {}", position),
                    ));
                }
                token.push(c);
            }
        }
    }

    if stack.len() != 1 {
        return Err(syntax_error(
            "PARENTHESES_MISMATCH",
            "parentheses",
            format!("{} unclosed parenthesis in HED string", stack.len() - 1),
        ));
    }
    let mut root = stack.pop().unwrap_or_default();
    flush_token(&mut token, closed_group, &mut root, text.len())?;
    Ok(root)
}

fn split_prefix(tag: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = tag.split_once(':') {
        if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return (prefix, rest);
        }
    }
    ("", tag)
}

/// Resolve a single tag against the schemas.
///
/// Returns the resolved tag and any warnings, or the first error.
pub(crate) fn resolve_tag(
    original: &str,
    schemas: &Schemas,
) -> Result<(ParsedHedTag, Vec<Issue>), Issue> {
    let (prefix, body) = split_prefix(original);
    let invalid = |internal: &str, message: String| {
        Issue::error("TAG_INVALID", internal, message).with_parameter(PARAM_TAG, original)
    };

    let schema: &HedSchema = schemas.get(prefix).ok_or_else(|| {
        Issue::error(
            "TAG_NAMESPACE_PREFIX_INVALID",
            "unmatchedLibrarySchema",
            format!("Tag '{}' uses unknown schema prefix '{}:'", original, prefix),
        )
        .with_parameter(PARAM_TAG, original)
    })?;

    let components: Vec<&str> = body.split('/').map(str::trim).collect();
    if components.iter().any(|c| c.is_empty()) {
        return Err(invalid(
            "extraSlash",
            format!("Tag '{}' has an empty path component", original),
        ));
    }

    let (anchor_index, anchor) = components
        .iter()
        .enumerate()
        .find_map(|(i, c)| schema.tag(c).map(|t| (i, t)))
        .ok_or_else(|| invalid("invalidTag", format!("Invalid tag - \"{}\"", original)))?;

    if !schema.ancestors_match(anchor, &components[..anchor_index]) {
        return Err(invalid(
            "invalidParentNode",
            format!(
                "Tag '{}' does not match the schema path '{}'",
                original, anchor.long_name
            ),
        ));
    }

    let mut warnings = Vec::new();
    let mut current: &SchemaTag = anchor;
    let mut value = None;
    let mut extension = None;
    let mut index = anchor_index + 1;

    while index < components.len() {
        if current.takes_value {
            value = Some(components[index..].join("/"));
            break;
        }
        match schema.tag(components[index]) {
            Some(child) if child.parent.as_deref() == Some(&current.name.to_lowercase()) => {
                current = child;
                index += 1;
            }
            Some(other) => {
                return Err(invalid(
                    "invalidParentNode",
                    format!(
                        "'{}' in tag '{}' already appears in the schema as '{}'",
                        components[index], original, other.long_name
                    ),
                ));
            }
            None => {
                let rest = components[index..].join("/");
                if !schema.allows_extension(current) {
                    return Err(Issue::error(
                        "TAG_EXTENSION_INVALID",
                        "invalidExtension",
                        format!(
                            "Tag '{}' extends '{}', which does not allow extension",
                            original, current.long_name
                        ),
                    )
                    .with_parameter(PARAM_TAG, original));
                }
                warnings.push(
                    Issue::warning(
                        "TAG_EXTENDED",
                        "extension",
                        format!("Tag '{}' extends the schema with '{}'", original, rest),
                    )
                    .with_parameter(PARAM_TAG, original),
                );
                extension = Some(rest);
                break;
            }
        }
    }

    if current.requires_child && value.is_none() && extension.is_none() {
        return Err(Issue::error(
            "TAG_REQUIRES_CHILD",
            "childRequired",
            format!("Tag '{}' requires a child or value", original),
        )
        .with_parameter(PARAM_TAG, original));
    }

    Ok((
        ParsedHedTag {
            original: original.to_string(),
            prefix: prefix.to_string(),
            long_name: current.long_name.clone(),
            value,
            extension,
        },
        warnings,
    ))
}

/// Parse and validate a HED string with explicit options.
pub fn parse_hed_string(
    text: &str,
    schemas: &Schemas,
    options: ParseOptions<'_>,
) -> (Option<ParsedHedString>, Vec<Issue>, Vec<Issue>) {
    let raw = match split_hed_string(text) {
        Ok(raw) => raw,
        Err(issue) => return (None, vec![issue], Vec::new()),
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let children = resolve_nodes(&raw, schemas, &options, &mut errors, &mut warnings);

    let parsed = ParsedHedString {
        source: text.to_string(),
        children,
    };
    (Some(parsed), errors, warnings)
}

/// Parse and validate a standalone HED string (an event annotation).
///
/// Definitions are not allowed; `Def/` references are checked against the
/// given manager, or reported as missing when no manager is given.
pub fn parse_standalone_hed_string(
    text: &str,
    schemas: &Schemas,
    definitions: Option<&DefinitionManager>,
) -> (Option<ParsedHedString>, Vec<Issue>, Vec<Issue>) {
    parse_hed_string(
        text,
        schemas,
        ParseOptions {
            definitions_allowed: false,
            placeholders_allowed: false,
            check_def_references: true,
            definitions,
        },
    )
}

fn resolve_nodes(
    raw: &[RawNode],
    schemas: &Schemas,
    options: &ParseOptions<'_>,
    errors: &mut Vec<Issue>,
    warnings: &mut Vec<Issue>,
) -> Vec<HedNode> {
    let mut nodes = Vec::with_capacity(raw.len());
    for node in raw {
        match node {
            RawNode::Group(children) => {
                nodes.push(HedNode::Group(resolve_nodes(
                    children, schemas, options, errors, warnings,
                )));
            }
            RawNode::Tag(text) => match resolve_tag(text, schemas) {
                Ok((tag, tag_warnings)) => {
                    warnings.extend(tag_warnings);
                    errors.extend(check_context(&tag, options));
                    nodes.push(HedNode::Tag(tag));
                }
                Err(issue) => errors.push(issue),
            },
        }
    }
    nodes
}

fn check_context(tag: &ParsedHedTag, options: &ParseOptions<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();

    if tag.value.as_deref().is_some_and(|v| v.contains('#')) && !options.placeholders_allowed {
        issues.push(
            Issue::error(
                "PLACEHOLDER_INVALID",
                "invalidPlaceholderContext",
                format!("Placeholder '#' is not allowed in tag '{}'", tag.original),
            )
            .with_parameter(PARAM_TAG, &tag.original),
        );
    }

    if tag.is("Definition") && !options.definitions_allowed {
        issues.push(
            Issue::error(
                "DEFINITION_INVALID",
                "illegalDefinitionContext",
                format!("Definition '{}' is not allowed here", tag.original),
            )
            .with_parameter(PARAM_TAG, &tag.original),
        );
    }

    if (tag.is("Def") || tag.is("Def-expand")) && options.check_def_references {
        let value = tag.value.as_deref().unwrap_or_default();
        let (name, placeholder_value) = match value.split_once('/') {
            Some((name, rest)) => (name, Some(rest)),
            None => (value, None),
        };
        let definition = options.definitions.and_then(|m| m.get(name));
        let problem = match definition {
            None => Some((
                "missingDefinition",
                format!("Def tag '{}' refers to an unknown definition", tag.original),
            )),
            Some(def) if def.takes_placeholder() && placeholder_value.is_none() => Some((
                "missingPlaceholder",
                format!("Def tag '{}' requires a value", tag.original),
            )),
            Some(def) if !def.takes_placeholder() && placeholder_value.is_some() => Some((
                "extraPlaceholder",
                format!("Def tag '{}' does not take a value", tag.original),
            )),
            Some(_) => None,
        };
        if let Some((internal, message)) = problem {
            issues.push(
                Issue::error("DEF_INVALID", internal, message)
                    .with_parameter(PARAM_TAG, &tag.original),
            );
        }
    }

    issues
}
