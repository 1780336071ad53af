// Shortcut registry - cached access to templates and macros in a ShortcutStore
//
// Reads are memoized per (scope, record kind); popup searches filter the
// memoized templates. Every write goes to the store first
// and then invalidates the whole scope, so the next lookup refetches.

use std::sync::Arc;

use async_trait::async_trait;

use super::cache::{CacheFilter, ShortcutCache};
use super::{validate_macro, Macro, RegistryError, Scope, TextExpansion};

/// Backend trait for shortcut persistence.
///
/// The primary implementation is TursoClient; tests use an in-memory store.
#[async_trait]
pub trait ShortcutStore: Send + Sync {
    /// List all templates of a scope, in creation order.
    async fn list_text_expansions(&self, scope: &Scope) -> Result<Vec<TextExpansion>, RegistryError>;

    async fn insert_text_expansion(&self, scope: &Scope, entry: &TextExpansion) -> Result<(), RegistryError>;

    async fn update_text_expansion(&self, scope: &Scope, entry: &TextExpansion) -> Result<(), RegistryError>;

    async fn delete_text_expansion(&self, scope: &Scope, id: &str) -> Result<(), RegistryError>;

    /// List all macros of a scope, in creation order.
    async fn list_macros(&self, scope: &Scope) -> Result<Vec<Macro>, RegistryError>;

    async fn get_macro(&self, scope: &Scope, id: &str) -> Result<Option<Macro>, RegistryError>;

    async fn insert_macro(&self, scope: &Scope, item: &Macro) -> Result<(), RegistryError>;

    /// Replace title, trigger, actions and active flag of a macro. If it stays
    /// active on an Alt trigger, every other macro of the scope bound to the
    /// same key is deactivated in the same transaction.
    ///
    /// Returns the IDs that were deactivated.
    async fn update_macro(&self, scope: &Scope, item: &Macro) -> Result<Vec<String>, RegistryError>;

    async fn delete_macro(&self, scope: &Scope, id: &str) -> Result<(), RegistryError>;

    /// Mark a macro active. For an Alt trigger, every other macro of the scope
    /// bound to the same key is deactivated in the same transaction.
    ///
    /// Returns the IDs that were deactivated.
    async fn activate_macro(&self, scope: &Scope, id: &str) -> Result<Vec<String>, RegistryError>;

    async fn deactivate_macro(&self, scope: &Scope, id: &str) -> Result<(), RegistryError>;
}

/// Registry for text expansions and macros
pub struct ShortcutRegistry {
    store: Arc<dyn ShortcutStore>,
    cache: ShortcutCache,
}

impl ShortcutRegistry {
    pub fn new(store: Arc<dyn ShortcutStore>) -> Self {
        Self {
            store,
            cache: ShortcutCache::new(),
        }
    }

    /// All templates of a scope
    pub async fn text_expansions(&self, scope: &Scope) -> Result<Arc<Vec<TextExpansion>>, RegistryError> {
        let filter = CacheFilter::TextExpansions;
        if let Some(hit) = self.cache.expansions(scope, &filter) {
            return Ok(hit);
        }
        crate::debug!("Text expansion cache miss for {:?}", scope);
        let items = Arc::new(self.store.list_text_expansions(scope).await?);
        self.cache.put_expansions(scope, filter, items.clone());
        Ok(items)
    }

    /// Templates matching a popup query; an empty query returns all templates.
    /// Filters the cached template list, so new queries never reach the store.
    pub async fn search_text_expansions(
        &self,
        scope: &Scope,
        query: &str,
    ) -> Result<Arc<Vec<TextExpansion>>, RegistryError> {
        let all = self.text_expansions(scope).await?;
        Ok(filter_by_query(all, query))
    }

    /// All macros of a scope, active or not
    pub async fn macros(&self, scope: &Scope) -> Result<Arc<Vec<Macro>>, RegistryError> {
        if let Some(hit) = self.cache.macros(scope) {
            return Ok(hit);
        }
        crate::debug!("Macro cache miss for {:?}", scope);
        let items = Arc::new(self.store.list_macros(scope).await?);
        self.cache.put_macros(scope, items.clone());
        Ok(items)
    }

    /// Cached templates of a scope, without touching the store
    pub fn cached_text_expansions(&self, scope: &Scope) -> Option<Arc<Vec<TextExpansion>>> {
        self.cache.expansions(scope, &CacheFilter::TextExpansions)
    }

    /// Search over the cached templates, without touching the store
    pub fn cached_search(&self, scope: &Scope, query: &str) -> Option<Arc<Vec<TextExpansion>>> {
        self.cached_text_expansions(scope)
            .map(|all| filter_by_query(all, query))
    }

    pub fn cached_macros(&self, scope: &Scope) -> Option<Arc<Vec<Macro>>> {
        self.cache.macros(scope)
    }

    pub async fn get_macro(&self, scope: &Scope, id: &str) -> Result<Macro, RegistryError> {
        self.store
            .get_macro(scope, id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Add a new template; the trigger is optional
    #[must_use = "this returns a Result that should be handled"]
    pub async fn add_text_expansion(
        &self,
        scope: &Scope,
        name: String,
        trigger: Option<String>,
        replacement: String,
    ) -> Result<TextExpansion, RegistryError> {
        let entry = TextExpansion {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            trigger: normalize_trigger(trigger),
            replacement,
        };
        self.store.insert_text_expansion(scope, &entry).await?;
        self.invalidate(scope);
        Ok(entry)
    }

    #[must_use = "this returns a Result that should be handled"]
    pub async fn update_text_expansion(&self, scope: &Scope, mut entry: TextExpansion) -> Result<(), RegistryError> {
        entry.trigger = normalize_trigger(entry.trigger);
        self.store.update_text_expansion(scope, &entry).await?;
        self.invalidate(scope);
        Ok(())
    }

    #[must_use = "this returns a Result that should be handled"]
    pub async fn delete_text_expansion(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        self.store.delete_text_expansion(scope, id).await?;
        self.invalidate(scope);
        Ok(())
    }

    /// Persist a new macro. Macros are stored inactive; use `activate` to arm one.
    #[must_use = "this returns a Result that should be handled"]
    pub async fn create_macro(&self, scope: &Scope, mut item: Macro) -> Result<Macro, RegistryError> {
        validate_macro(&item)?;
        item.active = false;
        self.store.insert_macro(scope, &item).await?;
        self.invalidate(scope);
        crate::info!("Created macro '{}' ({} actions)", item.title, item.actions.len());
        Ok(item)
    }

    /// Update title, trigger and actions of a macro. If it is active and the
    /// trigger changed to a taken Alt key, the other holder is disarmed atomically.
    #[must_use = "this returns a Result that should be handled"]
    pub async fn update_macro(&self, scope: &Scope, item: Macro) -> Result<(), RegistryError> {
        validate_macro(&item)?;
        let deactivated = self.store.update_macro(scope, &item).await;
        self.invalidate(scope);
        for other in &deactivated? {
            crate::info!("Macro {} deactivated: Alt key taken by {}", other, item.id);
        }
        Ok(())
    }

    #[must_use = "this returns a Result that should be handled"]
    pub async fn delete_macro(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        self.store.delete_macro(scope, id).await?;
        self.invalidate(scope);
        Ok(())
    }

    /// Arm a macro, disarming any other active macro on the same Alt key
    #[must_use = "this returns a Result that should be handled"]
    pub async fn activate(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        let deactivated = self.store.activate_macro(scope, id).await;
        // Invalidate on failure too: the cached view may already be stale.
        self.invalidate(scope);
        let deactivated = deactivated?;
        for other in &deactivated {
            crate::info!("Macro {} deactivated: Alt key taken by {}", other, id);
        }
        Ok(())
    }

    #[must_use = "this returns a Result that should be handled"]
    pub async fn deactivate(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        self.store.deactivate_macro(scope, id).await?;
        self.invalidate(scope);
        Ok(())
    }

    /// Drop every cached result for `scope`
    pub fn invalidate(&self, scope: &Scope) {
        self.cache.invalidate(scope);
    }
}

fn filter_by_query(all: Arc<Vec<TextExpansion>>, query: &str) -> Arc<Vec<TextExpansion>> {
    if query.is_empty() {
        return all;
    }
    Arc::new(all.iter().filter(|e| e.matches_query(query)).cloned().collect())
}

fn normalize_trigger(trigger: Option<String>) -> Option<String> {
    trigger
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
