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

//! Schema version key normalization.

/// Canonicalize a comma-separated schema version specification.
///
/// Parts are trimmed, empty parts dropped and the rest joined with a bare
/// comma. Order is kept: `"b,a"` and `"a,b"` are different keys.
///
/// ```
/// use hed_mcp::version::normalize_version;
///
/// assert_eq!(normalize_version(" 8.4.0, sc:score_2.0.0 ,"), "8.4.0,sc:score_2.0.0");
/// ```
pub fn normalize_version(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
