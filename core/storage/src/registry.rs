//! Provider registry for resolving the active backend.

use std::collections::HashMap;
use std::sync::Arc;

use blobswitch_common::{Error, ProviderId, Result};
use blobswitch_config::{ConfigDocument, CredentialBlock};

use crate::provider::StorageClient;

/// Factory function type for creating clients from a credential block.
pub type ProviderFactory =
    Box<dyn Fn(&CredentialBlock) -> Result<Arc<dyn StorageClient>> + Send + Sync>;

/// Registry mapping each provider to the factory that builds its client.
pub struct ProviderRegistry {
    factories: HashMap<ProviderId, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a provider factory.
    ///
    /// # Errors
    /// - `InvalidInput` if the provider is already registered
    pub fn register(&mut self, id: ProviderId, factory: ProviderFactory) -> Result<()> {
        if self.factories.contains_key(&id) {
            return Err(Error::InvalidInput(format!(
                "Provider '{}' is already registered",
                id
            )));
        }
        self.factories.insert(id, factory);
        Ok(())
    }

    /// Build a client for the document's active provider.
    ///
    /// This is where an unrecognized persisted provider name surfaces.
    ///
    /// # Errors
    /// - `UnknownProvider` if `active_provider` names no registered backend
    /// - `ConfigUnavailable` if the document has no credential block for it
    /// - Whatever the backend constructor reports for unusable credentials
    pub fn resolve(&self, doc: &ConfigDocument) -> Result<Arc<dyn StorageClient>> {
        let id: ProviderId = doc.active_provider.parse()?;
        let factory = self
            .factories
            .get(&id)
            .ok_or_else(|| Error::UnknownProvider(id.to_string()))?;
        let credentials = doc.credentials(id).ok_or_else(|| {
            Error::ConfigUnavailable(format!("No credentials configured for '{}'", id))
        })?;

        factory(credentials)
    }

    /// Get list of registered providers.
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.factories.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with every built-in backend.
pub fn create_default_registry() -> ProviderRegistry {
    let mut factories: HashMap<ProviderId, ProviderFactory> = HashMap::new();
    factories.insert(ProviderId::Aws, Box::new(crate::s3::create_s3_client));
    factories.insert(
        ProviderId::Cloudinary,
        Box::new(crate::cloudinary::create_cloudinary_client),
    );

    ProviderRegistry { factories }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::S3Client;
    use object_store::memory::InMemory;

    fn memory_factory() -> ProviderFactory {
        Box::new(|_: &CredentialBlock| {
            let client: Arc<dyn StorageClient> =
                Arc::new(S3Client::with_store(Arc::new(InMemory::new()), "mem"));
            Ok(client)
        })
    }

    fn document(active: &str) -> ConfigDocument {
        let mut doc = ConfigDocument::new(ProviderId::Aws);
        doc.active_provider = active.to_string();
        doc
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderId::Aws, memory_factory()).unwrap();

        let client = registry.resolve(&document("aws")).unwrap();
        assert_eq!(client.provider(), ProviderId::Aws);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderId::Aws, memory_factory()).unwrap();

        let result = registry.register(ProviderId::Aws, memory_factory());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        let registry = create_default_registry();
        let result = registry.resolve(&document("bogus"));
        assert!(matches!(result, Err(Error::UnknownProvider(name)) if name == "bogus"));
    }

    #[test]
    fn test_resolve_unregistered_provider_fails() {
        let registry = ProviderRegistry::new();
        let result = registry.resolve(&document("cloudinary"));
        assert!(matches!(result, Err(Error::UnknownProvider(_))));
    }

    #[test]
    fn test_resolve_missing_credentials_block() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderId::Aws, memory_factory()).unwrap();

        let doc = ConfigDocument::from_json(r#"{"active_provider":"aws"}"#).unwrap();
        assert!(matches!(
            registry.resolve(&doc),
            Err(Error::ConfigUnavailable(_))
        ));
    }

    #[test]
    fn test_resolve_non_object_credentials_block() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderId::Aws, memory_factory()).unwrap();

        let doc = ConfigDocument::from_json(r#"{"active_provider":"aws","aws":42}"#).unwrap();
        assert!(matches!(
            registry.resolve(&doc),
            Err(Error::ConfigUnavailable(_))
        ));
    }

    #[test]
    fn test_default_registry_builds_both_backends() {
        let registry = create_default_registry();
        assert_eq!(registry.providers(), vec![ProviderId::Aws, ProviderId::Cloudinary]);

        let mut doc = document("aws");
        doc.credentials_mut(ProviderId::Aws)
            .unwrap()
            .insert("bucket".to_string(), "photos".into());
        doc.credentials_mut(ProviderId::Cloudinary)
            .unwrap()
            .insert("cloud_name".to_string(), "demo".into());

        assert_eq!(registry.resolve(&doc).unwrap().provider(), ProviderId::Aws);

        doc.active_provider = "cloudinary".to_string();
        assert_eq!(
            registry.resolve(&doc).unwrap().provider(),
            ProviderId::Cloudinary
        );
    }
}
