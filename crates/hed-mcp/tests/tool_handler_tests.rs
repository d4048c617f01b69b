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

//! End-to-end tests for the tool handlers against the fixture schema.

use hed_mcp::backend::{FsReader, HedBackend, LocalBackend};
use hed_mcp::schema_cache::SchemaCache;
use hed_mcp::tools::{
    get_file_from_path, validate_hed_sidecar, validate_hed_string, validate_hed_tsv, GetFileArgs,
    SidecarData, ToolContext, ValidateSidecarArgs, ValidateStringArgs, ValidateTsvArgs,
    ValidationResult,
};
use hed_validator::{
    BidsSidecar, BidsTsvFile, Definition, DefinitionManager, Issue, Schemas, TsvIssue,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas")
}

/// Counts every call into the validator.
#[derive(Default)]
struct Calls {
    parse_definition: AtomicUsize,
    add_definitions: AtomicUsize,
    parse_hed_string: AtomicUsize,
    validate_sidecar: AtomicUsize,
    validate_tsv: AtomicUsize,
}

struct CountingBackend {
    inner: LocalBackend,
    calls: Calls,
}

impl HedBackend for CountingBackend {
    fn parse_definition(
        &self,
        text: &str,
        schemas: &Schemas,
    ) -> (Option<Definition>, Vec<Issue>, Vec<Issue>) {
        self.calls.parse_definition.fetch_add(1, Ordering::SeqCst);
        self.inner.parse_definition(text, schemas)
    }

    fn add_definitions(
        &self,
        manager: &mut DefinitionManager,
        definitions: Vec<Definition>,
    ) -> Vec<Issue> {
        self.calls.add_definitions.fetch_add(1, Ordering::SeqCst);
        self.inner.add_definitions(manager, definitions)
    }

    fn parse_hed_string(
        &self,
        text: &str,
        schemas: &Schemas,
        definitions: Option<&DefinitionManager>,
    ) -> (Vec<Issue>, Vec<Issue>) {
        self.calls.parse_hed_string.fetch_add(1, Ordering::SeqCst);
        self.inner.parse_hed_string(text, schemas, definitions)
    }

    fn validate_sidecar(&self, sidecar: &BidsSidecar, schemas: &Schemas) -> Vec<Issue> {
        self.calls.validate_sidecar.fetch_add(1, Ordering::SeqCst);
        self.inner.validate_sidecar(sidecar, schemas)
    }

    fn validate_tsv(&self, tsv: &BidsTsvFile<'_>, schemas: &Schemas) -> Vec<TsvIssue> {
        self.calls.validate_tsv.fetch_add(1, Ordering::SeqCst);
        self.inner.validate_tsv(tsv, schemas)
    }
}

fn setup() -> (ToolContext, Arc<CountingBackend>) {
    let backend = Arc::new(CountingBackend {
        inner: LocalBackend::new(fixture_dir()),
        calls: Calls::default(),
    });
    let cache = Arc::new(SchemaCache::new(Arc::new(LocalBackend::new(fixture_dir()))));
    let ctx = ToolContext::with_parts(cache, backend.clone(), Arc::new(FsReader));
    (ctx, backend)
}

fn string_args(hed: &str, check_for_warnings: bool) -> ValidateStringArgs {
    ValidateStringArgs {
        hed_string: hed.to_string(),
        hed_version: "8.4.0".to_string(),
        check_for_warnings,
        definitions: None,
    }
}

fn tsv_args(file_path: &str) -> ValidateTsvArgs {
    ValidateTsvArgs {
        file_path: file_path.to_string(),
        hed_version: "8.4.0".to_string(),
        check_for_warnings: false,
        file_data: None,
        json_data: None,
        definitions: None,
    }
}

fn sidecar_args(data: Option<SidecarData>) -> ValidateSidecarArgs {
    ValidateSidecarArgs {
        file_path: "/data/task-go_events.json".to_string(),
        hed_version: "8.4.0".to_string(),
        check_for_warnings: false,
        file_data: data,
    }
}

// ============ String validation ============

#[tokio::test]
async fn test_valid_string_has_no_issues() {
    let (ctx, _) = setup();
    let result = validate_hed_string(&ctx, string_args("Event/Sensory-event, Red, Blue", false)).await;
    assert_eq!(result, ValidationResult::default());
}

#[tokio::test]
async fn test_invalid_tag_is_one_error() {
    let (ctx, _) = setup();
    for check in [false, true] {
        let result = validate_hed_string(&ctx, string_args("InvalidTag", check)).await;
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "TAG_INVALID");
        assert_eq!(result.errors[0].severity, "error");
        assert!(result.warnings.is_empty());
    }
}

#[tokio::test]
async fn test_warnings_only_when_requested() {
    let (ctx, _) = setup();

    let quiet = validate_hed_string(&ctx, string_args("Object/Widget, Red", false)).await;
    assert!(quiet.errors.is_empty());
    assert!(quiet.warnings.is_empty());

    let loud = validate_hed_string(&ctx, string_args("Object/Widget, Red", true)).await;
    assert!(loud.errors.is_empty());
    assert_eq!(loud.warnings.len(), 1);
    assert_eq!(loud.warnings[0].code, "TAG_EXTENDED");
    assert_eq!(loud.warnings[0].severity, "warning");
}

#[tokio::test]
async fn test_bad_definition_short_circuits_string_validation() {
    let (ctx, backend) = setup();
    let mut args = string_args("Def/Go, Red", false);
    args.definitions = Some(vec![
        "(Definition/Go, (Sensory-event))".to_string(),
        "(Definition/Broken, (Red)".to_string(),
    ]);

    let result = validate_hed_string(&ctx, args).await;
    assert!(!result.errors.is_empty());
    assert_eq!(backend.calls.parse_definition.load(Ordering::SeqCst), 2);
    assert_eq!(backend.calls.add_definitions.load(Ordering::SeqCst), 0);
    assert_eq!(backend.calls.parse_hed_string.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_definitions_resolve_def_references() {
    let (ctx, backend) = setup();

    let without = validate_hed_string(&ctx, string_args("Def/Go", false)).await;
    assert_eq!(without.errors.len(), 1);
    assert_eq!(without.errors[0].code, "DEF_INVALID");

    let mut args = string_args("Def/Go, Red", false);
    args.definitions = Some(vec!["(Definition/Go, (Sensory-event))".to_string()]);
    let with = validate_hed_string(&ctx, args).await;
    assert!(with.errors.is_empty(), "{:?}", with.errors);
    assert_eq!(backend.calls.add_definitions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_schema_failure_is_single_error() {
    let (ctx, backend) = setup();
    let mut args = string_args("Red", true);
    args.hed_version = "9.9.9".to_string();

    let result = validate_hed_string(&ctx, args).await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "SCHEMA_LOAD_FAILED");
    assert!(result.warnings.is_empty());
    assert_eq!(backend.calls.parse_hed_string.load(Ordering::SeqCst), 0);
    assert!(!ctx.cache.contains("9.9.9"));
}

#[tokio::test]
async fn test_schema_is_shared_across_calls() {
    let (ctx, _) = setup();
    validate_hed_string(&ctx, string_args("Red", false)).await;
    validate_hed_string(&ctx, string_args("Blue", false)).await;

    let stats = ctx.cache.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

// ============ TSV validation ============

#[tokio::test]
async fn test_tsv_without_hed_columns_skips_validation() {
    let (ctx, backend) = setup();
    let mut args = tsv_args("/data/task-go_events.tsv");
    args.file_data = Some("onset\tduration\ttrial_type\n1.0\t0.5\tgo\n".to_string());

    let result = validate_hed_tsv(&ctx, args).await;
    assert_eq!(result, ValidationResult::default());
    assert_eq!(backend.calls.validate_tsv.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tsv_from_file_reports_row_errors() {
    let (ctx, backend) = setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("task-go_events.tsv");
    std::fs::write(&path, "onset\tHED\n1.0\tSensory-event, Red\n2.0\tNotATag\n").unwrap();

    let result = validate_hed_tsv(&ctx, tsv_args(path.to_str().unwrap())).await;
    assert_eq!(backend.calls.validate_tsv.load(Ordering::SeqCst), 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "TAG_INVALID");
    assert_eq!(result.errors[0].line, "3");
    assert_eq!(result.errors[0].location, path.to_str().unwrap());
}

#[tokio::test]
async fn test_tsv_with_inline_sidecar() {
    let (ctx, _) = setup();
    let mut args = tsv_args("/data/task-go_events.tsv");
    args.check_for_warnings = true;
    args.file_data = Some("onset\ttrial_type\n1.0\tgo\n2.0\tstop\n".to_string());
    args.json_data = Some(
        json!({"trial_type": {"HED": {"go": "Sensory-event, Green", "stop": "Agent-action"}}})
            .to_string(),
    );

    let result = validate_hed_tsv(&ctx, args).await;
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
}

#[tokio::test]
async fn test_tsv_rejects_non_object_sidecar() {
    let (ctx, backend) = setup();
    let mut args = tsv_args("/data/task-go_events.tsv");
    args.file_data = Some("onset\ttrial_type\n1.0\tgo\n".to_string());
    args.json_data = Some("[1, 2]".to_string());

    let result = validate_hed_tsv(&ctx, args).await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "SIDECAR_INVALID");
    assert!(result.warnings.is_empty());
    assert_eq!(backend.calls.validate_tsv.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tsv_line_numbers_skip_blank_lines() {
    let (ctx, _) = setup();
    let mut args = tsv_args("/data/task-go_events.tsv");
    args.file_data = Some("onset\tHED\n1.0\tRed\n\n2.0\tNotATag\n".to_string());

    let result = validate_hed_tsv(&ctx, args).await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "TAG_INVALID");
    assert_eq!(result.errors[0].line, "4");
}

#[tokio::test]
async fn test_tsv_missing_file() {
    let (ctx, _) = setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.tsv");

    let result = validate_hed_tsv(&ctx, tsv_args(path.to_str().unwrap())).await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "FILE_NOT_FOUND");
}

#[tokio::test]
async fn test_tsv_definition_failure_short_circuits_file_read() {
    let (ctx, backend) = setup();
    let mut args = tsv_args("/does/not/exist.tsv");
    args.definitions = Some(vec!["(Definition/X, (NotATag))".to_string()]);

    let result = validate_hed_tsv(&ctx, args).await;
    assert!(!result.errors.is_empty());
    assert!(result.errors.iter().all(|e| e.code != "FILE_NOT_FOUND"));
    assert_eq!(backend.calls.validate_tsv.load(Ordering::SeqCst), 0);
}

// ============ Sidecar validation ============

#[tokio::test]
async fn test_sidecar_invalid_json_text() {
    let (ctx, backend) = setup();
    let result =
        validate_hed_sidecar(&ctx, sidecar_args(Some(SidecarData::Text("{\"a\": ".to_string())))).await;

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "JSON_PARSE_ERROR");
    assert_eq!(backend.calls.validate_sidecar.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sidecar_errors_and_warnings_partitioned() {
    let (ctx, _) = setup();
    let mut args = sidecar_args(Some(SidecarData::Parsed(json!({
        "trial_type": {"HED": {"go": "Sensory-event, NotATag", "stop": "Object/Widget"}},
        "response_time": {"HED": "Duration/# s"}
    }))));
    args.check_for_warnings = true;

    let result = validate_hed_sidecar(&ctx, args).await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "TAG_INVALID");
    assert_eq!(result.errors[0].column, "trial_type");
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, "TAG_EXTENDED");

    let parsed: serde_json::Value = serde_json::from_str(&result.parsed_hed_sidecar).unwrap();
    assert_eq!(parsed["response_time"]["HED"], "Duration/# s");
}

#[tokio::test]
async fn test_sidecar_from_file() {
    let (ctx, backend) = setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("task-go_events.json");
    std::fs::write(&path, r#"{"trial_type": {"HED": {"go": "Sensory-event"}}}"#).unwrap();

    let mut args = sidecar_args(None);
    args.file_path = path.to_string_lossy().into_owned();
    let result = validate_hed_sidecar(&ctx, args).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(backend.calls.validate_sidecar.load(Ordering::SeqCst), 1);
    assert!(result.parsed_hed_sidecar.contains("trial_type"));
}

// ============ File access ============

#[tokio::test]
async fn test_get_file_relative_path() {
    let (ctx, _) = setup();
    let result = get_file_from_path(
        &ctx,
        GetFileArgs {
            file_path: "relative/events.tsv".to_string(),
        },
    )
    .await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "INVALID_FILE_PATH");
}
