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

//! Collaborator seams used by the tool handlers.
//!
//! Handlers talk to the validator, the schema loader and the file system
//! only through these traits, so each can be replaced in tests.

use crate::error::FileReadError;
use async_trait::async_trait;
use hed_validator::async_api::build_schemas_from_version_async;
use hed_validator::{
    parse_definition_string, parse_standalone_hed_string, BidsSidecar, BidsTsvFile, Definition,
    DefinitionManager, Issue, SchemaError, Schemas, TsvIssue,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads the schemas named by a version specification.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    async fn load(&self, version: &str) -> Result<Schemas, SchemaError>;
}

/// The validation entry points the handlers depend on.
///
/// Every method returns issues instead of failing; errors and warnings
/// are segregated only where the validator itself does so.
pub trait HedBackend: Send + Sync {
    /// Parse one definition string into `(definition, errors, warnings)`.
    fn parse_definition(
        &self,
        text: &str,
        schemas: &Schemas,
    ) -> (Option<Definition>, Vec<Issue>, Vec<Issue>);

    /// Register a batch of definitions, returning any conflicts.
    fn add_definitions(
        &self,
        manager: &mut DefinitionManager,
        definitions: Vec<Definition>,
    ) -> Vec<Issue>;

    /// Validate a standalone annotation into `(errors, warnings)`.
    fn parse_hed_string(
        &self,
        text: &str,
        schemas: &Schemas,
        definitions: Option<&DefinitionManager>,
    ) -> (Vec<Issue>, Vec<Issue>);

    fn validate_sidecar(&self, sidecar: &BidsSidecar, schemas: &Schemas) -> Vec<Issue>;

    fn validate_tsv(&self, tsv: &BidsTsvFile<'_>, schemas: &Schemas) -> Vec<TsvIssue>;
}

/// Reads UTF-8 text files by absolute path.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, FileReadError>;
}

/// Validator backed by `hed-validator`, loading schema XML from a directory.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    schema_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }
}

#[async_trait]
impl SchemaLoader for LocalBackend {
    async fn load(&self, version: &str) -> Result<Schemas, SchemaError> {
        debug!(version, dir = %self.schema_dir.display(), "Loading HED schemas");
        build_schemas_from_version_async(version, &self.schema_dir).await
    }
}

impl HedBackend for LocalBackend {
    fn parse_definition(
        &self,
        text: &str,
        schemas: &Schemas,
    ) -> (Option<Definition>, Vec<Issue>, Vec<Issue>) {
        parse_definition_string(text, schemas)
    }

    fn add_definitions(
        &self,
        manager: &mut DefinitionManager,
        definitions: Vec<Definition>,
    ) -> Vec<Issue> {
        manager.add_definitions(definitions)
    }

    fn parse_hed_string(
        &self,
        text: &str,
        schemas: &Schemas,
        definitions: Option<&DefinitionManager>,
    ) -> (Vec<Issue>, Vec<Issue>) {
        let (_, errors, warnings) = parse_standalone_hed_string(text, schemas, definitions);
        (errors, warnings)
    }

    fn validate_sidecar(&self, sidecar: &BidsSidecar, schemas: &Schemas) -> Vec<Issue> {
        sidecar.validate(schemas)
    }

    fn validate_tsv(&self, tsv: &BidsTsvFile<'_>, schemas: &Schemas) -> Vec<TsvIssue> {
        tsv.validate(schemas)
    }
}

/// File reader over the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

#[async_trait]
impl FileReader for FsReader {
    async fn read(&self, path: &str) -> Result<String, FileReadError> {
        if !Path::new(path).is_absolute() {
            return Err(FileReadError::NotAbsolute(path.to_string()));
        }
        tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileReadError::NotFound(path.to_string()),
            _ => FileReadError::Io {
                path: path.to_string(),
                message: e.to_string(),
            },
        })
    }
}
