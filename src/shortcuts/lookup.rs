//! Synchronous registry access for the input hook thread.
//!
//! The hook callback is not async and must return quickly. Cache hits are
//! served without touching the runtime; a miss blocks on the store for at
//! most the configured timeout and otherwise reports `Unavailable`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::{Macro, RegistryError, Scope, ShortcutRegistry, TextExpansion};

/// Read-only view of the registry used by the trigger state machine
pub trait TriggerLookup: Send + Sync {
    fn text_expansions(&self, scope: &Scope) -> Result<Arc<Vec<TextExpansion>>, RegistryError>;

    fn macros(&self, scope: &Scope) -> Result<Arc<Vec<Macro>>, RegistryError>;

    /// Templates shown in the search popup for `query`
    fn search(&self, scope: &Scope, query: &str) -> Result<Arc<Vec<TextExpansion>>, RegistryError>;
}

/// Bridges the async registry into blocking calls with a deadline
pub struct BlockingLookup {
    registry: Arc<ShortcutRegistry>,
    runtime: Handle,
    timeout: Duration,
}

impl BlockingLookup {
    pub fn new(registry: Arc<ShortcutRegistry>, runtime: Handle, timeout: Duration) -> Self {
        Self {
            registry,
            runtime,
            timeout,
        }
    }

    fn block<T, F>(&self, future: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        let timeout = self.timeout;
        let bounded = async move {
            match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(RegistryError::Unavailable(format!(
                    "store did not answer within {}ms",
                    timeout.as_millis()
                ))),
            }
        };

        match Handle::try_current() {
            Ok(_) => tokio::task::block_in_place(|| self.runtime.block_on(bounded)),
            Err(_) => self.runtime.block_on(bounded),
        }
    }
}

impl TriggerLookup for BlockingLookup {
    fn text_expansions(&self, scope: &Scope) -> Result<Arc<Vec<TextExpansion>>, RegistryError> {
        if let Some(hit) = self.registry.cached_text_expansions(scope) {
            return Ok(hit);
        }
        self.block(self.registry.text_expansions(scope))
    }

    fn macros(&self, scope: &Scope) -> Result<Arc<Vec<Macro>>, RegistryError> {
        if let Some(hit) = self.registry.cached_macros(scope) {
            return Ok(hit);
        }
        self.block(self.registry.macros(scope))
    }

    fn search(&self, scope: &Scope, query: &str) -> Result<Arc<Vec<TextExpansion>>, RegistryError> {
        if let Some(hit) = self.registry.cached_search(scope, query) {
            return Ok(hit);
        }
        self.block(self.registry.search_text_expansions(scope, query))
    }
}

#[cfg(test)]
#[path = "lookup_test.rs"]
mod tests;
