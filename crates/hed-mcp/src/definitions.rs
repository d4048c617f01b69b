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

//! Definition assembly for a single tool call.
//!
//! Caller-supplied definition strings are parsed and registered into a
//! fresh [`DefinitionManager`] that is handed to the validator as context.

use crate::backend::HedBackend;
use crate::issues::{format_all, FormattedIssue};
use hed_validator::{Definition, DefinitionManager, Issue, Schemas};

/// Outcome of parsing a list of definition strings.
#[derive(Debug, Default)]
pub struct DefinitionConversion {
    pub definitions: Vec<Definition>,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

/// Outcome of building a definition manager.
///
/// `manager` is `None` only when no definitions were supplied. For any
/// non-empty input it is `Some`, but holds nothing unless `errors` is
/// empty; check `errors` to detect failure.
#[derive(Debug, Default)]
pub struct DefinitionAssembly {
    pub manager: Option<DefinitionManager>,
    pub errors: Vec<FormattedIssue>,
    pub warnings: Vec<FormattedIssue>,
}

/// Parse each string in order, collecting definitions and issues.
pub fn convert_definitions(
    backend: &dyn HedBackend,
    strings: &[String],
    schemas: &Schemas,
) -> DefinitionConversion {
    let mut out = DefinitionConversion::default();
    for text in strings {
        let (definition, errors, warnings) = backend.parse_definition(text, schemas);
        out.errors.extend(errors);
        out.warnings.extend(warnings);
        out.definitions.extend(definition);
    }
    out
}

/// Build the manager for a call's `definitions` argument.
///
/// Registration happens in one batch and only when parsing produced at
/// least one definition and no errors.
pub fn create_definition_manager(
    backend: &dyn HedBackend,
    strings: Option<&[String]>,
    schemas: &Schemas,
) -> DefinitionAssembly {
    let strings = match strings {
        Some(strings) if !strings.is_empty() => strings,
        _ => return DefinitionAssembly::default(),
    };

    let DefinitionConversion {
        definitions,
        mut errors,
        warnings,
    } = convert_definitions(backend, strings, schemas);

    let mut manager = DefinitionManager::new();
    if !definitions.is_empty() && errors.is_empty() {
        let conflicts = backend.add_definitions(&mut manager, definitions);
        errors.extend(conflicts);
    }

    DefinitionAssembly {
        manager: Some(manager),
        errors: format_all(errors),
        warnings: format_all(warnings),
    }
}
