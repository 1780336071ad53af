// Memoized registry results keyed by (scope, filter)
// Any write for a scope drops every entry of that scope; misses refetch lazily

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Macro, Scope, TextExpansion};

/// Which result set a cache entry holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheFilter {
    TextExpansions,
    Macros,
}

#[derive(Debug, Clone)]
enum Cached {
    Expansions(Arc<Vec<TextExpansion>>),
    Macros(Arc<Vec<Macro>>),
}

/// Shared cache between the hook thread (reads) and CRUD callers (writes)
#[derive(Debug, Default)]
pub struct ShortcutCache {
    entries: RwLock<HashMap<(Scope, CacheFilter), Cached>>,
}

impl ShortcutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expansions(&self, scope: &Scope, filter: &CacheFilter) -> Option<Arc<Vec<TextExpansion>>> {
        match self.entries.read().get(&(scope.clone(), filter.clone())) {
            Some(Cached::Expansions(items)) => Some(items.clone()),
            _ => None,
        }
    }

    pub fn macros(&self, scope: &Scope) -> Option<Arc<Vec<Macro>>> {
        match self.entries.read().get(&(scope.clone(), CacheFilter::Macros)) {
            Some(Cached::Macros(items)) => Some(items.clone()),
            _ => None,
        }
    }

    pub fn put_expansions(&self, scope: &Scope, filter: CacheFilter, items: Arc<Vec<TextExpansion>>) {
        self.entries
            .write()
            .insert((scope.clone(), filter), Cached::Expansions(items));
    }

    pub fn put_macros(&self, scope: &Scope, items: Arc<Vec<Macro>>) {
        self.entries
            .write()
            .insert((scope.clone(), CacheFilter::Macros), Cached::Macros(items));
    }

    /// Drop every memoized result for `scope`
    pub fn invalidate(&self, scope: &Scope) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(s, _), _| s != scope);
        crate::trace!(
            "Invalidated {} cache entries for scope {:?}",
            before - entries.len(),
            scope
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
