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

//! HED MCP Server binary.
//!
//! # Usage
//!
//! ```bash
//! # MCP over stdio with schemas from ./schemas
//! hed-mcp
//!
//! # HTTP REST server
//! hed-mcp --transport http --bind 0.0.0.0:8080 --schema-dir /opt/hed/schemas
//!
//! # Run with debug logging
//! RUST_LOG=debug hed-mcp
//! ```

use clap::{Parser, ValueEnum};
use hed_mcp::{http, HedMcpConfig, McpServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// JSON-RPC over stdin/stdout
    Stdio,
    /// REST over HTTP
    Http,
}

#[derive(Parser)]
#[command(name = "hed-mcp")]
#[command(author = "Dweve B.V.")]
#[command(version)]
#[command(about = "HED validation server for MCP clients and HTTP")]
struct Cli {
    /// Transport to serve
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Directory containing HED schema XML files
    #[arg(short, long, default_value = "schemas")]
    schema_dir: PathBuf,

    /// Listen address for the HTTP transport
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries JSON-RPC.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hed_mcp=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = HedMcpConfig {
        schema_dir: cli.schema_dir.canonicalize().unwrap_or(cli.schema_dir),
        bind: cli.bind,
        ..Default::default()
    };

    match cli.transport {
        Transport::Stdio => McpServer::new(config).run_stdio_async().await?,
        Transport::Http => http::serve(&config).await?,
    }

    Ok(())
}
