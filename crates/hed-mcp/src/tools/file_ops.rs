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

//! File access tool.

use crate::error::ToolError;
use crate::issues::FormattedIssue;
use crate::tools::helpers::validate_input_size;
use crate::tools::types::{FileContentResult, GetFileArgs, MAX_INPUT_SIZE};
use crate::tools::ToolContext;

/// Return the text of a file by absolute path.
pub async fn get_file_from_path(ctx: &ToolContext, args: GetFileArgs) -> FileContentResult {
    match read(ctx, &args).await {
        Ok(contents) => FileContentResult {
            file_path: args.file_path,
            contents,
            errors: Vec::new(),
        },
        Err(err) => FileContentResult {
            file_path: args.file_path,
            contents: String::new(),
            errors: vec![FormattedIssue::from_tool_error(err)],
        },
    }
}

async fn read(ctx: &ToolContext, args: &GetFileArgs) -> Result<String, ToolError> {
    let contents = ctx.reader.read(&args.file_path).await?;
    validate_input_size(&contents, MAX_INPUT_SIZE)?;
    Ok(contents)
}
