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

//! Async schema loading with Tokio.
//!
//! ```no_run
//! use hed_validator::async_api::build_schemas_from_version_async;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schemas = build_schemas_from_version_async("8.4.0, sc:score_2.0.0", "schemas").await?;
//! assert_eq!(schemas.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::error::SchemaError;
use crate::schema::{assemble_schemas, io_error, parse_version_spec, Schemas};
use std::path::Path;

/// Load the schemas named by a version specification without blocking.
///
/// Schema files are read concurrently; the first failure is returned.
pub async fn build_schemas_from_version_async(
    spec: &str,
    schema_dir: impl AsRef<Path>,
) -> Result<Schemas, SchemaError> {
    let schema_dir = schema_dir.as_ref();
    let specs = parse_version_spec(spec)?;

    let mut reads = tokio::task::JoinSet::new();
    for (index, s) in specs.into_iter().enumerate() {
        let path = schema_dir.join(s.file_name());
        reads.spawn(async move {
            let xml = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| io_error(&path, e))?;
            Ok::<_, SchemaError>((index, s, xml))
        });
    }

    let mut sources = Vec::with_capacity(reads.len());
    while let Some(joined) = reads.join_next().await {
        let loaded = joined.map_err(|e| SchemaError::Io {
            path: schema_dir.display().to_string(),
            message: e.to_string(),
        })??;
        sources.push(loaded);
    }
    sources.sort_by_key(|(index, _, _)| *index);

    assemble_schemas(sources.into_iter().map(|(_, s, xml)| (s, xml)).collect())
}
