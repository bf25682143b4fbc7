//! Cloudinary storage client implementation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use blobswitch_common::{BlobDescriptor, Error, ProviderId, Result, UploadReceipt};
use blobswitch_config::CredentialBlock;

use crate::provider::{collect_stream, ByteStream, StorageClient};

use super::auth::Credentials;
use super::client::{MediaClient, API_BASE, DELIVERY_BASE};

/// Maximum number of assets returned by one [`StorageClient::list`] call.
/// Assets past the cap are not returned.
pub const LIST_MAX_RESULTS: u32 = 30;

const DEFAULT_RESOURCE_TYPE: &str = "image";

/// Credential block of the `cloudinary` provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// `image`, `video` or `raw`; defaults to `image`.
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub delivery_base: Option<String>,
}

impl CloudinaryConfig {
    /// Extract the configuration from a credential block.
    pub fn from_credentials(credentials: &CredentialBlock) -> Result<Self> {
        serde_json::from_value(Value::Object(credentials.clone()))
            .map_err(|e| Error::InvalidInput(format!("Invalid cloudinary credentials: {}", e)))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Storage client over a Cloudinary account.
///
/// The upload name becomes the asset's public ID as-is; Cloudinary itself
/// may reject or normalize IDs it does not accept. The receipt carries the
/// public ID as identifier and the secure delivery URL as locator.
pub struct CloudinaryClient {
    api: MediaClient,
}

impl CloudinaryClient {
    /// Bind a client to an account. No request is sent here.
    pub fn new(config: &CloudinaryConfig) -> Result<Self> {
        let credentials = Credentials::new(
            config.cloud_name.clone(),
            config.api_key.clone(),
            config.api_secret.clone(),
        )?;
        let api = MediaClient::with_endpoints(
            credentials,
            non_empty(&config.resource_type).unwrap_or(DEFAULT_RESOURCE_TYPE),
            non_empty(&config.api_base).unwrap_or(API_BASE),
            non_empty(&config.delivery_base).unwrap_or(DELIVERY_BASE),
        )?;

        Ok(Self { api })
    }

    pub fn api(&self) -> &MediaClient {
        &self.api
    }
}

/// Create a client from the `cloudinary` credential block.
pub fn create_cloudinary_client(credentials: &CredentialBlock) -> Result<Arc<dyn StorageClient>> {
    let config = CloudinaryConfig::from_credentials(credentials)?;
    Ok(Arc::new(CloudinaryClient::new(&config)?))
}

#[async_trait]
impl StorageClient for CloudinaryClient {
    fn provider(&self) -> ProviderId {
        ProviderId::Cloudinary
    }

    async fn upload(&self, name: &str, data: ByteStream) -> Result<UploadReceipt> {
        let data = collect_stream(data).await?;
        let asset = self.api.upload(name, data).await?;

        debug!(public_id = %asset.public_id, size = asset.bytes, "Uploaded asset");
        Ok(UploadReceipt {
            identifier: asset.public_id,
            locator: asset.secure_url,
        })
    }

    async fn list(&self) -> Result<Vec<BlobDescriptor>> {
        let resources = self.api.list_resources(LIST_MAX_RESULTS).await?;
        if resources.len() as u32 >= LIST_MAX_RESULTS {
            warn!(cap = LIST_MAX_RESULTS, "Asset listing reached the result cap");
        }

        Ok(resources
            .into_iter()
            .map(|r| BlobDescriptor::new(r.public_id, r.bytes))
            .collect())
    }

    async fn download(&self, identifier: &str) -> Result<Vec<u8>> {
        let data = self.api.fetch(identifier).await?;
        debug!(public_id = %identifier, size = data.len(), "Downloaded asset");
        Ok(data)
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        let existed = self.api.destroy(identifier).await?;
        debug!(public_id = %identifier, existed, "Destroyed asset");
        Ok(())
    }
}
