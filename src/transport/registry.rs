//! Named-configuration client registry.
//!
//! Multiple logical configurations that resolve to the same physical client
//! share one [`ShareableClient`], keyed by configuration name, so the
//! underlying pool is started and stopped once no matter how many handles
//! exist.

use crate::base::error::EntityError;
use crate::http::message::{WireRequest, WireResponse};
use crate::transport::client::TransportClient;
use crate::transport::shareable::ShareableClient;
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;

/// Registry of shareable clients keyed by configuration name.
pub struct ClientRegistry<C: TransportClient> {
    clients: DashMap<String, Arc<ShareableClient<C>>>,
}

impl<C: TransportClient> Default for ClientRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TransportClient> ClientRegistry<C> {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Acquire a handle on the client for `name`, creating the client via
    /// `make` on first use. The handle releases its reference on drop.
    pub fn connect(
        &self,
        name: &str,
        make: impl FnOnce() -> C,
    ) -> Result<ClientHandle<C>, EntityError> {
        let shared = self
            .clients
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(config = name, "creating shareable client");
                Arc::new(ShareableClient::new(make()))
            })
            .clone();

        shared.acquire()?;
        Ok(ClientHandle { shared })
    }

    /// Drop the client for a torn-down configuration. Outstanding handles
    /// keep the client alive until they release.
    pub fn dispose(&self, name: &str) {
        self.clients.remove(name);
    }

    /// Number of registered configurations (diagnostic hook).
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// RAII reference on a shared client: acquired on creation, released on
/// drop, so handle lifetime and usage counting cannot drift apart.
pub struct ClientHandle<C: TransportClient> {
    shared: Arc<ShareableClient<C>>,
}

impl<C: TransportClient> ClientHandle<C> {
    pub fn send(&self, request: WireRequest) -> BoxFuture<'_, Result<WireResponse, EntityError>> {
        self.shared.send(request)
    }

    pub fn usage_count(&self) -> usize {
        self.shared.usage_count()
    }
}

impl<C: TransportClient> Drop for ClientHandle<C> {
    fn drop(&mut self) {
        self.shared.release();
    }
}
