//! In-memory store for offline use and tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lenswatch_core::{LensSummary, ScopedGraph};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{FetchError, GraphStore, StoreConnector};

/// Holds pre-shaped scope query results keyed by lens name.
///
/// Each entry is exactly what the scope query would return for that lens,
/// so the store does no expansion of its own. Entries can be swapped between
/// fetches to simulate a store converging on a change.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    scopes: RwLock<HashMap<String, Value>>,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roots returned for `lens`.
    pub async fn set_scope(&self, lens: &str, roots: Vec<Value>) {
        self.inner
            .scopes
            .write()
            .await
            .insert(lens.to_string(), Value::Array(roots));
    }

    /// Load a `{"lens name": [roots...]}` fixture document. Nothing is
    /// loaded unless every entry is a list.
    pub async fn load_fixture(&self, fixture: Value) -> Result<usize, FetchError> {
        let Value::Object(lenses) = fixture else {
            return Err(FetchError::Decode("fixture must be an object keyed by lens name".to_string()));
        };
        if let Some((lens, _)) = lenses.iter().find(|(_, roots)| !roots.is_array()) {
            return Err(FetchError::Decode(format!("fixture entry for {} is not a list", lens)));
        }

        let count = lenses.len();
        self.inner.scopes.write().await.extend(lenses);
        Ok(count)
    }

    pub async fn remove_lens(&self, lens: &str) {
        self.inner.scopes.write().await.remove(lens);
    }

    /// Make the next `count` fetches fail.
    pub fn fail_next(&self, count: usize) {
        self.inner.failures.store(count, Ordering::SeqCst);
    }

    /// Number of scope fetches served or failed so far.
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.inner
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Every whitespace-separated term of `prefix` appears as a word of `name`.
fn full_text_match(name: &str, prefix: &str) -> bool {
    let words: Vec<String> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    prefix
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|term| words.contains(&term))
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn fetch_scope(&self, lens: &str) -> Result<ScopedGraph, FetchError> {
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(FetchError::Injected(format!("fetch of lens {}", lens)));
        }

        let roots = self.inner.scopes.read().await.get(lens).cloned();
        match roots {
            Some(roots) => Ok(ScopedGraph::from_json(roots)?),
            None => {
                debug!("Lens {} not present in memory store", lens);
                Ok(ScopedGraph::default())
            }
        }
    }

    async fn list_lenses(&self, prefix: &str) -> Result<Vec<LensSummary>, FetchError> {
        let scopes = self.inner.scopes.read().await;

        let mut lenses = Vec::new();
        for roots in scopes.values() {
            let Some(roots) = roots.as_array() else {
                continue;
            };
            for root in roots {
                let summary: LensSummary = serde_json::from_value(root.clone())
                    .map_err(|e| FetchError::Decode(e.to_string()))?;
                let matches = if prefix.is_empty() {
                    summary.score.is_some()
                } else {
                    full_text_match(&summary.lens, prefix)
                };
                if matches {
                    lenses.push(summary);
                }
            }
        }

        lenses.sort_by(|a, b| b.rank().total_cmp(&a.rank()).then_with(|| a.lens.cmp(&b.lens)));
        Ok(lenses)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self) -> Result<Box<dyn GraphStore>, FetchError> {
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
