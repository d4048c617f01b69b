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

//! HED schema loading.
//!
//! Schemas are read from the standard HED XML format. Only the tag
//! hierarchy and the attributes this crate validates against are kept:
//! `takesValue` (via a `#` child node), `extensionAllowed` and
//! `requireChild`.
//!
//! A version specification lists one or more schemas separated by commas.
//! Each part has the form `[prefix:][library_]X.Y.Z`, for example
//! `8.4.0, sc:score_2.0.0`. Schema files are looked up by name in a schema
//! directory: `HED8.4.0.xml` for the standard schema and
//! `HED_score_2.0.0.xml` for library schemas.

use crate::error::SchemaError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Maximum node nesting accepted in schema XML.
const MAX_NODE_DEPTH: usize = 64;

/// A tag node of a loaded schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTag {
    /// Short name as written in the schema.
    pub name: String,
    /// Full path from the schema root, `/`-separated.
    pub long_name: String,
    /// Lowercase short name of the parent node.
    pub parent: Option<String>,
    /// Whether the node has a `#` value child.
    pub takes_value: bool,
    pub extension_allowed: bool,
    pub requires_child: bool,
}

/// A single loaded HED schema.
#[derive(Debug, Clone)]
pub struct HedSchema {
    version: String,
    library: Option<String>,
    tags: HashMap<String, SchemaTag>,
}

struct PendingNode {
    name: Option<String>,
    attributes: Vec<String>,
    takes_value: bool,
    parent: Option<String>,
}

impl HedSchema {
    /// Parse a schema from HED XML.
    pub fn from_xml(xml: &str) -> Result<Self, SchemaError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut version = String::new();
        let mut library = None;
        let mut path: Vec<String> = Vec::new();
        let mut pending: Vec<PendingNode> = Vec::new();
        let mut tags: HashMap<String, SchemaTag> = HashMap::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "HED" {
                        for attr in e.attributes().flatten() {
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            let value = String::from_utf8_lossy(&attr.value).to_string();
                            match key.as_str() {
                                "version" => version = value,
                                "library" => library = Some(value),
                                _ => {}
                            }
                        }
                    } else if name == "node" {
                        if pending.len() >= MAX_NODE_DEPTH {
                            return Err(SchemaError::Xml {
                                pos: reader.buffer_position(),
                                message: format!("node nesting exceeds {}", MAX_NODE_DEPTH),
                            });
                        }
                        let parent = pending
                            .last()
                            .and_then(|p| p.name.as_ref())
                            .map(|n| n.to_lowercase());
                        pending.push(PendingNode {
                            name: None,
                            attributes: Vec::new(),
                            takes_value: false,
                            parent,
                        });
                    }
                    path.push(name);
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| SchemaError::Xml {
                            pos: reader.buffer_position(),
                            message: e.to_string(),
                        })?
                        .trim()
                        .to_string();
                    let depth = path.len();
                    if depth >= 2 && path[depth - 1] == "name" && path[depth - 2] == "node" {
                        if let Some(node) = pending.last_mut() {
                            node.name = Some(text);
                        }
                    } else if depth >= 3
                        && path[depth - 1] == "name"
                        && path[depth - 2] == "attribute"
                        && path[depth - 3] == "node"
                    {
                        if let Some(node) = pending.last_mut() {
                            node.attributes.push(text);
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"node" {
                        if let Some(node) = pending.pop() {
                            finish_node(node, &mut pending, &mut tags);
                        }
                    }
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(SchemaError::Xml {
                        pos: reader.buffer_position(),
                        message: e.to_string(),
                    })
                }
                _ => {}
            }
        }

        if tags.is_empty() {
            return Err(SchemaError::Empty(version));
        }

        let long_names: Vec<(String, String)> = tags
            .keys()
            .map(|key| (key.clone(), long_name_for(&tags, key)))
            .collect();
        for (key, long_name) in long_names {
            if let Some(tag) = tags.get_mut(&key) {
                tag.long_name = long_name;
            }
        }

        Ok(Self {
            version,
            library,
            tags,
        })
    }

    /// Version declared in the schema header.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Library name for library schemas, `None` for the standard schema.
    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    /// Number of tags in the schema.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Look up a tag by short name (case-insensitive).
    pub fn tag(&self, name: &str) -> Option<&SchemaTag> {
        self.tags.get(&name.to_lowercase())
    }

    /// Parent node of a tag.
    pub fn parent_of(&self, tag: &SchemaTag) -> Option<&SchemaTag> {
        tag.parent.as_ref().and_then(|p| self.tags.get(p))
    }

    /// Whether a tag or any of its ancestors allows extension.
    pub fn allows_extension(&self, tag: &SchemaTag) -> bool {
        let mut current = Some(tag);
        let mut depth = 0;
        while let Some(node) = current {
            if node.extension_allowed {
                return true;
            }
            depth += 1;
            if depth > MAX_NODE_DEPTH {
                break;
            }
            current = self.parent_of(node);
        }
        false
    }

    /// Check that `prefix` matches the trailing ancestors of `tag`.
    ///
    /// Used for long-form and partial-path tags such as
    /// `Event/Sensory-event` or `Sensory-event`.
    pub fn ancestors_match(&self, tag: &SchemaTag, prefix: &[&str]) -> bool {
        let ancestors: Vec<&str> = tag.long_name.split('/').collect();
        let ancestors = &ancestors[..ancestors.len().saturating_sub(1)];
        if prefix.len() > ancestors.len() {
            return false;
        }
        ancestors[ancestors.len() - prefix.len()..]
            .iter()
            .zip(prefix)
            .all(|(a, p)| a.eq_ignore_ascii_case(p))
    }
}

fn finish_node(
    node: PendingNode,
    pending: &mut [PendingNode],
    tags: &mut HashMap<String, SchemaTag>,
) {
    let Some(name) = node.name else {
        return;
    };
    if name == "#" {
        if let Some(parent) = pending.last_mut() {
            parent.takes_value = true;
        }
        return;
    }
    let has = |attr: &str| node.attributes.iter().any(|a| a == attr);
    let tag = SchemaTag {
        long_name: String::new(),
        parent: node.parent,
        takes_value: node.takes_value,
        extension_allowed: has("extensionAllowed"),
        requires_child: has("requireChild"),
        name,
    };
    tags.insert(tag.name.to_lowercase(), tag);
}

fn long_name_for(tags: &HashMap<String, SchemaTag>, key: &str) -> String {
    let mut parts = Vec::new();
    let mut current = Some(key.to_string());
    while let Some(k) = current {
        match tags.get(&k) {
            Some(tag) => {
                parts.push(tag.name.clone());
                current = tag.parent.clone();
            }
            None => break,
        }
        if parts.len() > MAX_NODE_DEPTH {
            break;
        }
    }
    parts.reverse();
    parts.join("/")
}

/// One part of a schema version specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSpec {
    /// Namespace prefix without the colon, empty for unprefixed schemas.
    pub prefix: String,
    /// Library name, `None` for the standard schema.
    pub library: Option<String>,
    /// Semantic version `X.Y.Z`.
    pub version: String,
}

impl SchemaSpec {
    /// Parse one `[prefix:][library_]X.Y.Z` part.
    pub fn parse(part: &str) -> Result<Self, SchemaError> {
        let part = part.trim();
        let invalid = || SchemaError::InvalidVersion(part.to_string());

        let (prefix, rest) = match part.split_once(':') {
            Some((prefix, rest)) => {
                let prefix = prefix.trim();
                if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid());
                }
                (prefix.to_string(), rest.trim())
            }
            None => (String::new(), part),
        };

        let (library, version) = match rest.rsplit_once('_') {
            Some((library, version)) => {
                if library.is_empty()
                    || !library
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(invalid());
                }
                (Some(library.to_string()), version)
            }
            None => (None, rest),
        };

        if !is_semver(version) {
            return Err(invalid());
        }

        Ok(Self {
            prefix,
            library,
            version: version.to_string(),
        })
    }

    /// Schema file name for this part.
    pub fn file_name(&self) -> String {
        match &self.library {
            Some(library) => format!("HED_{}_{}.xml", library, self.version),
            None => format!("HED{}.xml", self.version),
        }
    }
}

fn is_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

/// Parse a full comma-separated version specification.
pub fn parse_version_spec(spec: &str) -> Result<Vec<SchemaSpec>, SchemaError> {
    let specs = spec
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(SchemaSpec::parse)
        .collect::<Result<Vec<_>, _>>()?;

    if specs.is_empty() {
        return Err(SchemaError::InvalidVersion(spec.to_string()));
    }

    let mut seen = HashSet::new();
    for s in &specs {
        if !seen.insert(s.prefix.as_str()) {
            return Err(SchemaError::DuplicatePrefix(s.prefix.clone()));
        }
    }

    Ok(specs)
}

/// A set of loaded schemas keyed by namespace prefix.
///
/// The unprefixed schema is stored under the empty prefix.
#[derive(Debug, Clone)]
pub struct Schemas {
    by_prefix: BTreeMap<String, HedSchema>,
}

impl Schemas {
    pub fn new(by_prefix: BTreeMap<String, HedSchema>) -> Self {
        Self { by_prefix }
    }

    /// Wrap a single unprefixed schema.
    pub fn single(schema: HedSchema) -> Self {
        let mut by_prefix = BTreeMap::new();
        by_prefix.insert(String::new(), schema);
        Self { by_prefix }
    }

    /// Schema registered under a prefix (without the colon).
    pub fn get(&self, prefix: &str) -> Option<&HedSchema> {
        self.by_prefix.get(prefix)
    }

    /// The unprefixed schema.
    pub fn base(&self) -> Option<&HedSchema> {
        self.get("")
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.by_prefix.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }

    /// Reconstruct a version specification for the loaded schemas.
    pub fn version_spec(&self) -> String {
        self.by_prefix
            .iter()
            .map(|(prefix, schema)| {
                let body = match schema.library() {
                    Some(library) => format!("{}_{}", library, schema.version()),
                    None => schema.version().to_string(),
                };
                if prefix.is_empty() {
                    body
                } else {
                    format!("{}:{}", prefix, body)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Assemble loaded schema sources into a [`Schemas`] set.
pub(crate) fn assemble_schemas(
    sources: Vec<(SchemaSpec, String)>,
) -> Result<Schemas, SchemaError> {
    let mut by_prefix = BTreeMap::new();
    for (spec, xml) in sources {
        let schema = HedSchema::from_xml(&xml)?;
        by_prefix.insert(spec.prefix, schema);
    }
    Ok(Schemas::new(by_prefix))
}

pub(crate) fn io_error(path: &Path, err: std::io::Error) -> SchemaError {
    if err.kind() == std::io::ErrorKind::NotFound {
        SchemaError::NotFound(path.display().to_string())
    } else {
        SchemaError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Load the schemas named by a version specification from a directory.
pub fn build_schemas_from_version(spec: &str, schema_dir: &Path) -> Result<Schemas, SchemaError> {
    let specs = parse_version_spec(spec)?;
    let mut sources = Vec::with_capacity(specs.len());
    for s in specs {
        let path = schema_dir.join(s.file_name());
        let xml = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        sources.push((s, xml));
    }
    assemble_schemas(sources)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HED version="8.4.0">
  <schema>
    <node>
      <name>Event</name>
      <node><name>Sensory-event</name></node>
      <node><name>Agent-action</name></node>
    </node>
    <node>
      <name>Item</name>
      <attribute><name>extensionAllowed</name></attribute>
      <node><name>Object</name></node>
    </node>
    <node>
      <name>Property</name>
      <node>
        <name>Color</name>
        <node><name>Red</name></node>
        <node><name>Blue</name></node>
      </node>
      <node>
        <name>Duration</name>
        <attribute><name>requireChild</name></attribute>
        <node><name>#</name><attribute><name>takesValue</name></attribute></node>
      </node>
      <node>
        <name>Label</name>
        <attribute><name>requireChild</name></attribute>
        <node><name>#</name></node>
      </node>
      <node>
        <name>Definition</name>
        <attribute><name>requireChild</name></attribute>
        <node><name>#</name></node>
      </node>
      <node>
        <name>Def</name>
        <attribute><name>requireChild</name></attribute>
        <node><name>#</name></node>
      </node>
    </node>
  </schema>
</HED>"#;

    pub(crate) fn test_schemas() -> Schemas {
        Schemas::single(HedSchema::from_xml(TEST_SCHEMA).unwrap())
    }

    #[test]
    fn test_from_xml_reads_hierarchy() {
        let schema = HedSchema::from_xml(TEST_SCHEMA).unwrap();
        assert_eq!(schema.version(), "8.4.0");
        assert_eq!(schema.library(), None);

        let tag = schema.tag("sensory-event").unwrap();
        assert_eq!(tag.long_name, "Event/Sensory-event");
        assert_eq!(tag.parent.as_deref(), Some("event"));

        let duration = schema.tag("Duration").unwrap();
        assert!(duration.takes_value);
        assert!(duration.requires_child);
        assert!(schema.tag("#").is_none());
    }

    #[test]
    fn test_extension_inherited_from_ancestor() {
        let schema = HedSchema::from_xml(TEST_SCHEMA).unwrap();
        let object = schema.tag("Object").unwrap();
        assert!(schema.allows_extension(object));
        let red = schema.tag("Red").unwrap();
        assert!(!schema.allows_extension(red));
    }

    #[test]
    fn test_ancestors_match() {
        let schema = HedSchema::from_xml(TEST_SCHEMA).unwrap();
        let red = schema.tag("Red").unwrap();
        assert!(schema.ancestors_match(red, &[]));
        assert!(schema.ancestors_match(red, &["Color"]));
        assert!(schema.ancestors_match(red, &["property", "color"]));
        assert!(!schema.ancestors_match(red, &["Event"]));
    }

    #[test]
    fn test_empty_schema_rejected() {
        let result = HedSchema::from_xml(r#"<HED version="1.0.0"><schema></schema></HED>"#);
        assert!(matches!(result, Err(SchemaError::Empty(_))));
    }

    #[test]
    fn test_parse_version_spec() {
        let specs = parse_version_spec(" 8.4.0, sc:score_2.0.0 ,, lang_1.1.0").unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].file_name(), "HED8.4.0.xml");
        assert_eq!(specs[1].prefix, "sc");
        assert_eq!(specs[1].file_name(), "HED_score_2.0.0.xml");
        assert_eq!(specs[2].library.as_deref(), Some("lang"));
    }

    #[test]
    fn test_parse_version_spec_errors() {
        assert!(matches!(
            parse_version_spec("8.4"),
            Err(SchemaError::InvalidVersion(_))
        ));
        assert!(matches!(
            parse_version_spec(" , "),
            Err(SchemaError::InvalidVersion(_))
        ));
        assert!(matches!(
            parse_version_spec("8.4.0, 8.3.0"),
            Err(SchemaError::DuplicatePrefix(_))
        ));
        assert!(matches!(
            parse_version_spec("s1:score_1.0.0"),
            Err(SchemaError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_build_schemas_from_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("HED8.4.0.xml"), TEST_SCHEMA).unwrap();

        let schemas = build_schemas_from_version("8.4.0", dir.path()).unwrap();
        assert_eq!(schemas.len(), 1);
        assert!(schemas.base().is_some());
        assert_eq!(schemas.version_spec(), "8.4.0");

        let missing = build_schemas_from_version("8.3.0", dir.path());
        assert!(matches!(missing, Err(SchemaError::NotFound(_))));
    }
}
