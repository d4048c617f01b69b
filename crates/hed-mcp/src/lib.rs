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

//! HED Model Context Protocol (MCP) Server
//!
//! Exposes HED (Hierarchical Event Descriptor) validation to AI/LLM
//! clients over MCP and to other programs over HTTP. Key features:
//!
//! - **Validate HED strings** against any schema version, with definitions
//! - **Validate BIDS TSV files** and their JSON sidecars
//! - **Schema caching**: each version is loaded once per process
//! - **Uniform issue records** whatever shape the validator reports
//!
//! Both transports share one [`ToolContext`], so the schema cache is
//! process-wide.

pub mod backend;
pub mod definitions;
mod error;
pub mod http;
pub mod issues;
pub mod protocol;
pub mod schema_cache;
mod server;
pub mod tools;
pub mod version;

pub use backend::{FileReader, FsReader, HedBackend, LocalBackend, SchemaLoader};
pub use error::{FileReadError, McpError, McpResult, ToolError};
pub use issues::{format_issue, format_issues, partition_by_severity, FormattedIssue, RawIssue};
pub use schema_cache::{SchemaCache, SchemaCacheStats};
pub use server::{HedMcpConfig, McpServer};
pub use tools::{execute_tool, get_tools, ToolContext};

/// MCP Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name for MCP protocol
pub const SERVER_NAME: &str = "hed-mcp";
