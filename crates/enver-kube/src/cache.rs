//! Per-context client cache shared by concurrent executions

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Clients keyed by kubeconfig context name
///
/// Lookups take a read lock only. Construction is serialized by a separate
/// async mutex and the map is checked again once it is held, so each
/// context is built at most once.
pub struct ClientCache<P> {
    clients: RwLock<HashMap<String, Arc<P>>>,
    construction: Mutex<()>,
}

impl<P> ClientCache<P> {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            construction: Mutex::new(()),
        }
    }

    /// Cached client for `context`, if any
    pub fn get(&self, context: &str) -> Option<Arc<P>> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context)
            .cloned()
    }

    /// Return the cached client, building it with `init` on first use
    ///
    /// A failed `init` caches nothing; the next caller retries.
    pub async fn get_or_try_init<F, Fut, E>(&self, context: &str, init: F) -> Result<Arc<P>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P, E>>,
    {
        if let Some(client) = self.get(context) {
            return Ok(client);
        }

        let _guard = self.construction.lock().await;
        if let Some(client) = self.get(context) {
            return Ok(client);
        }

        tracing::debug!(context, "creating cluster client");
        let client = Arc::new(init().await?);
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(context.to_string(), Arc::clone(&client));

        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P> Default for ClientCache<P> {
    fn default() -> Self {
        Self::new()
    }
}
