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

//! Process-wide cache of loaded HED schemas.
//!
//! Entries are keyed by the normalized version specification (see
//! [`normalize_version`]) and live until removed explicitly. There is no
//! size cap, TTL or automatic eviction.
//!
//! # Thread Safety
//!
//! Uses `DashMap` for concurrent access. Each key owns a
//! `tokio::sync::OnceCell`, so concurrent first requests for the same
//! version share a single load. No map guard is held across an await.

use crate::backend::SchemaLoader;
use crate::version::normalize_version;
use dashmap::DashMap;
use hed_validator::{SchemaError, Schemas};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

type Slot = Arc<OnceCell<Arc<Schemas>>>;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCacheStats {
    /// Normalized keys of loaded entries, sorted.
    pub keys: Vec<String>,
    /// Number of loaded entries.
    pub size: usize,
    /// Requests served from the cache.
    pub hits: u64,
    /// Requests that triggered a load.
    pub misses: u64,
}

/// Read-through schema cache.
///
/// # Example
///
/// ```no_run
/// use hed_mcp::backend::LocalBackend;
/// use hed_mcp::schema_cache::SchemaCache;
/// use std::sync::Arc;
///
/// # async fn demo() -> Result<(), hed_validator::SchemaError> {
/// let cache = SchemaCache::new(Arc::new(LocalBackend::new("schemas")));
/// let first = cache.get_or_create("8.4.0").await?;
/// let second = cache.get_or_create(" 8.4.0 ").await?;
/// assert!(Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
pub struct SchemaCache {
    entries: DashMap<String, Slot>,
    loader: Arc<dyn SchemaLoader>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SchemaCache {
    pub fn new(loader: Arc<dyn SchemaLoader>) -> Self {
        Self {
            entries: DashMap::new(),
            loader,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the schemas for `raw`, loading them on first use.
    ///
    /// The loader receives the caller's original string; the entry is
    /// stored under its normalized form. A failed load leaves no entry and
    /// the error is returned unchanged.
    pub async fn get_or_create(&self, raw: &str) -> Result<Arc<Schemas>, SchemaError> {
        let key = normalize_version(raw);
        let slot: Slot = Arc::clone(&*self.entries.entry(key.clone()).or_default());

        if let Some(schemas) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(version = %key, "Schema cache hit");
            return Ok(Arc::clone(schemas));
        }

        let start = Instant::now();
        let loaded_here = AtomicBool::new(false);
        let result = slot
            .get_or_try_init(|| async {
                loaded_here.store(true, Ordering::Relaxed);
                self.loader.load(raw).await.map(Arc::new)
            })
            .await
            .map(Arc::clone);

        match &result {
            Ok(_) if loaded_here.load(Ordering::Relaxed) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                // A failed earlier attempt may have dropped this slot from the map.
                self.entries
                    .entry(key.clone())
                    .and_modify(|current| {
                        if !current.initialized() {
                            *current = Arc::clone(&slot);
                        }
                    })
                    .or_insert_with(|| Arc::clone(&slot));
                info!(
                    version = %key,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Loaded HED schemas"
                );
            }
            Ok(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(version = %key, "Schema cache hit after concurrent load");
            }
            Err(err) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.entries
                    .remove_if(&key, |_, current| Arc::ptr_eq(current, &slot) && current.get().is_none());
                warn!(version = %key, error = %err, "Failed to load HED schemas");
            }
        }
        result
    }

    /// Whether a loaded entry exists for `raw`.
    pub fn contains(&self, raw: &str) -> bool {
        self.entries
            .get(&normalize_version(raw))
            .map_or(false, |slot| slot.initialized())
    }

    /// Drop the entry for `raw`. Returns whether a loaded entry was removed.
    pub fn remove(&self, raw: &str) -> bool {
        let key = normalize_version(raw);
        match self.entries.remove(&key) {
            Some((_, slot)) => {
                debug!(version = %key, "Evicted cached HED schemas");
                slot.initialized()
            }
            None => false,
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
        debug!("Cleared schema cache");
    }

    pub fn stats(&self) -> SchemaCacheStats {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        SchemaCacheStats {
            size: keys.len(),
            keys,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("entries", &self.entries.len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
