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

//! HED validation tools: strings, TSV files and JSON sidecars.
//!
//! Each handler runs the same pipeline: resolve the schema through the
//! cache, assemble caller definitions, acquire the content, validate, then
//! normalize and split the issues. Any failure along the way becomes a
//! single formatted error in the returned result.

use crate::definitions::create_definition_manager;
use crate::error::ToolError;
use crate::issues::{format_all, partition_by_severity, FormattedIssue, SeverityPartition};
use crate::tools::helpers::validate_input_size;
use crate::tools::types::{
    inline, SidecarData, SidecarValidationResult, ValidateSidecarArgs, ValidateStringArgs,
    ValidateTsvArgs, ValidationResult, MAX_INPUT_SIZE,
};
use crate::tools::ToolContext;
use hed_validator::{BidsFile, BidsSidecar, BidsTsvFile};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Validate a standalone HED annotation.
pub async fn validate_hed_string(ctx: &ToolContext, args: ValidateStringArgs) -> ValidationResult {
    run_string(ctx, &args)
        .await
        .unwrap_or_else(|err| ValidationResult::failure(FormattedIssue::from_tool_error(err)))
}

async fn run_string(
    ctx: &ToolContext,
    args: &ValidateStringArgs,
) -> Result<ValidationResult, ToolError> {
    validate_input_size(&args.hed_string, MAX_INPUT_SIZE)?;
    let schemas = ctx.cache.get_or_create(&args.hed_version).await?;

    let assembly =
        create_definition_manager(ctx.backend.as_ref(), args.definitions.as_deref(), &schemas);
    if !assembly.errors.is_empty() {
        debug!(errors = assembly.errors.len(), "Definitions rejected");
        return Ok(ValidationResult::new(
            assembly.errors,
            assembly.warnings,
            args.check_for_warnings,
        ));
    }

    let (errors, warnings) =
        ctx.backend
            .parse_hed_string(&args.hed_string, &schemas, assembly.manager.as_ref());

    let mut all_warnings = assembly.warnings;
    all_warnings.extend(format_all(warnings));
    Ok(ValidationResult::new(
        format_all(errors),
        all_warnings,
        args.check_for_warnings,
    ))
}

/// Validate the HED content of a BIDS TSV file, optionally with its sidecar.
pub async fn validate_hed_tsv(ctx: &ToolContext, args: ValidateTsvArgs) -> ValidationResult {
    run_tsv(ctx, &args)
        .await
        .unwrap_or_else(|err| ValidationResult::failure(FormattedIssue::from_tool_error(err)))
}

async fn run_tsv(ctx: &ToolContext, args: &ValidateTsvArgs) -> Result<ValidationResult, ToolError> {
    let schemas = ctx.cache.get_or_create(&args.hed_version).await?;

    let assembly =
        create_definition_manager(ctx.backend.as_ref(), args.definitions.as_deref(), &schemas);
    if !assembly.errors.is_empty() {
        debug!(errors = assembly.errors.len(), "Definitions rejected");
        return Ok(ValidationResult::new(
            assembly.errors,
            assembly.warnings,
            args.check_for_warnings,
        ));
    }

    let text = match inline(&args.file_data) {
        Some(data) => data.to_string(),
        None => ctx.reader.read(&args.file_path).await?,
    };
    validate_input_size(&text, MAX_INPUT_SIZE)?;

    let file = BidsFile::from_path(&args.file_path);
    let sidecar = match inline(&args.json_data) {
        Some(json) => {
            let json: JsonValue = serde_json::from_str(json)?;
            Some(BidsSidecar::new(file.name.clone(), file.clone(), json)?)
        }
        None => None,
    };

    let tsv = BidsTsvFile::with_sidecar(
        file.name.clone(),
        file,
        &text,
        sidecar,
        assembly.manager.as_ref(),
    );
    if !tsv.has_hed_data() {
        debug!(file = %args.file_path, "No HED columns, skipping validation");
        return Ok(ValidationResult::default());
    }

    let issues = ctx.backend.validate_tsv(&tsv, &schemas);
    let SeverityPartition { errors, others } = partition_by_severity(format_all(issues));

    let mut warnings = assembly.warnings;
    warnings.extend(others);
    Ok(ValidationResult::new(errors, warnings, args.check_for_warnings))
}

/// Validate a BIDS JSON sidecar and return its HED-bearing columns.
pub async fn validate_hed_sidecar(
    ctx: &ToolContext,
    args: ValidateSidecarArgs,
) -> SidecarValidationResult {
    run_sidecar(ctx, &args).await.unwrap_or_else(|err| {
        SidecarValidationResult::failure(FormattedIssue::from_tool_error(err))
    })
}

async fn run_sidecar(
    ctx: &ToolContext,
    args: &ValidateSidecarArgs,
) -> Result<SidecarValidationResult, ToolError> {
    let schemas = ctx.cache.get_or_create(&args.hed_version).await?;

    let json: JsonValue = match &args.file_data {
        Some(SidecarData::Parsed(value)) => value.clone(),
        Some(SidecarData::Text(text)) if !text.is_empty() => {
            validate_input_size(text, MAX_INPUT_SIZE)?;
            serde_json::from_str(text)?
        }
        _ => {
            let text = ctx.reader.read(&args.file_path).await?;
            validate_input_size(&text, MAX_INPUT_SIZE)?;
            serde_json::from_str(&text)?
        }
    };

    let file = BidsFile::from_path(&args.file_path);
    let sidecar = BidsSidecar::new(file.name.clone(), file, json)?;

    let issues = ctx.backend.validate_sidecar(&sidecar, &schemas);
    let SeverityPartition { errors, others } = partition_by_severity(format_all(issues));
    let ValidationResult { errors, warnings } =
        ValidationResult::new(errors, others, args.check_for_warnings);

    Ok(SidecarValidationResult {
        errors,
        warnings,
        parsed_hed_sidecar: sidecar.hed_data_json(),
    })
}
