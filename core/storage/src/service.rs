//! Entry point tying configuration to client construction.

use std::sync::Arc;

use tracing::info;

use blobswitch_common::Result;
use blobswitch_config::ConfigStore;

use crate::provider::StorageClient;
use crate::registry::{create_default_registry, ProviderRegistry};

/// Resolves the active provider and builds its client on demand.
///
/// Every call to [`BlobService::client`] reloads the configuration and
/// builds a new client, so a switch takes effect on the very next
/// operation. Clients are never cached.
pub struct BlobService {
    store: ConfigStore,
    registry: ProviderRegistry,
}

impl BlobService {
    /// Create a service with the built-in backends.
    pub fn new(store: ConfigStore) -> Self {
        Self::with_registry(store, create_default_registry())
    }

    /// Create with custom registry.
    pub fn with_registry(store: ConfigStore, registry: ProviderRegistry) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Name of the currently active provider.
    pub fn active_provider(&self) -> Result<String> {
        self.store.active_provider()
    }

    /// Persist a new active provider.
    ///
    /// Succeeds for any name; an unknown one fails on the next `client()`.
    pub fn set_active_provider(&self, id: &str) -> Result<()> {
        self.store.set_active_provider(id)
    }

    /// Build a client for the active provider.
    ///
    /// # Errors
    /// - `ConfigUnavailable` if the configuration cannot be loaded
    /// - `UnknownProvider` if the active provider has no backend
    pub fn client(&self) -> Result<Arc<dyn StorageClient>> {
        let doc = self.store.load()?;
        let client = self.registry.resolve(&doc)?;

        info!(provider = %client.provider(), "Resolved storage client");
        Ok(client)
    }
}
