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

//! HED Validator
//!
//! Schema loading and validation of HED (Hierarchical Event Descriptor)
//! annotations.
//!
//! # Features
//!
//! - Load HED XML schemas by version specification, including prefixed
//!   library schemas (`8.4.0, sc:score_2.0.0`)
//! - Validate standalone HED strings against the tag hierarchy
//! - Parse `Definition/` groups and check `Def/` references
//! - Validate BIDS JSON sidecars and TSV event files
//! - **Async schema loading** with Tokio (via `async` feature flag)
//!
//! Validators return errors and warnings as [`Issue`] values rather than
//! failing, so callers can report every problem found in one pass.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hed_validator::{build_schemas_from_version, parse_standalone_hed_string};
//! use std::path::Path;
//!
//! let schemas = build_schemas_from_version("8.4.0", Path::new("schemas"))?;
//! let (_, errors, warnings) =
//!     parse_standalone_hed_string("Sensory-event, Red", &schemas, None);
//! assert!(errors.is_empty());
//! # let _ = warnings;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Definitions
//!
//! ```rust,no_run
//! use hed_validator::{build_schemas_from_version, parse_definition_string, DefinitionManager};
//! use hed_validator::parse_standalone_hed_string;
//! use std::path::Path;
//!
//! let schemas = build_schemas_from_version("8.4.0", Path::new("schemas"))?;
//! let (definition, errors, _) =
//!     parse_definition_string("(Definition/Go, (Sensory-event))", &schemas);
//! assert!(errors.is_empty());
//!
//! let mut manager = DefinitionManager::new();
//! manager.add_definitions(definition.into_iter().collect());
//! let (_, errors, _) = parse_standalone_hed_string("Def/Go", &schemas, Some(&manager));
//! assert!(errors.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod issue;

pub mod bids;
pub mod definitions;
pub mod schema;
pub mod string;

#[cfg(feature = "async")]
pub mod async_api;

pub use bids::{BidsFile, BidsSidecar, BidsTsvFile, SidecarColumn};
pub use definitions::{parse_definition_string, Definition, DefinitionManager};
pub use error::{IssueError, SchemaError};
pub use issue::{
    FileIssue, Issue, Severity, TsvIssue, PARAM_FILE_PATH, PARAM_SIDECAR_KEY, PARAM_TAG,
    PARAM_TSV_LINE,
};
pub use schema::{build_schemas_from_version, parse_version_spec, HedSchema, SchemaSpec, Schemas};
pub use string::{parse_hed_string, parse_standalone_hed_string, ParseOptions, ParsedHedString};
