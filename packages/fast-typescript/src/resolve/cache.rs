// Resolve-id Cache
//
// Per-build memo of import specifier → outcome.

use super::ResolveIdResult;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::trace;

/// Outcomes keyed by the specifier alone, not by the importing file.
///
/// Concurrent first requests for one specifier wait for a single lookup.
#[derive(Debug, Default)]
pub struct ResolveIdCache {
    entries: DashMap<String, Arc<OnceCell<ResolveIdResult>>>,
}

impl ResolveIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, specifier: &str) -> Option<ResolveIdResult> {
        self.entries
            .get(specifier)
            .and_then(|cell| cell.value().get().cloned())
    }

    /// Returns the cached outcome, running `resolve` only on the first request.
    pub fn get_or_resolve<F>(&self, specifier: &str, resolve: F) -> ResolveIdResult
    where
        F: FnOnce() -> ResolveIdResult,
    {
        // Clone the cell out so the shard lock is not held while resolving.
        let cell = match self.entries.get(specifier) {
            Some(cell) => Arc::clone(cell.value()),
            None => Arc::clone(self.entries.entry(specifier.to_string()).or_default().value()),
        };

        if let Some(hit) = cell.get() {
            trace!(specifier, "resolve-id cache hit");
            return hit.clone();
        }
        cell.get_or_init(|| {
            trace!(specifier, "resolve-id cache miss");
            resolve()
        })
        .clone()
    }

    /// Number of specifiers with a stored outcome.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
