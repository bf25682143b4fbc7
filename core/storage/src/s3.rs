//! Object-storage backend (Amazon S3 and compatibles).

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::ObjectStore;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use blobswitch_common::{BlobDescriptor, Error, ProviderId, Result, UploadReceipt};
use blobswitch_config::CredentialBlock;

use crate::provider::{ByteStream, StorageClient};

/// Credential block of the `aws` provider.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl S3Config {
    /// Extract the configuration from a credential block.
    ///
    /// Known fields must be strings; other fields are ignored.
    pub fn from_credentials(credentials: &CredentialBlock) -> Result<Self> {
        serde_json::from_value(Value::Object(credentials.clone()))
            .map_err(|e| Error::InvalidInput(format!("Invalid aws credentials: {}", e)))
    }
}

/// Storage client over a bucket.
///
/// Object names are the identifiers and are stored verbatim. Names the
/// object path model cannot hold unchanged are rejected with `InvalidInput`
/// instead of being rewritten: the empty name, a leading or trailing `/`,
/// repeated `/`, `.` or `..` segments, and ASCII control characters.
pub struct S3Client {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl S3Client {
    /// Bind a client to an S3 bucket.
    ///
    /// Only builds the request signer; no request is sent until a contract
    /// method runs.
    ///
    /// # Errors
    /// - `InvalidInput` if the bucket is empty or the builder rejects the
    ///   configuration
    pub fn new(config: &S3Config) -> Result<Self> {
        if config.bucket.is_empty() {
            return Err(Error::InvalidInput("aws bucket is not configured".to_string()));
        }

        let mut builder = AmazonS3Builder::new().with_bucket_name(&config.bucket);
        if !config.region.is_empty() {
            builder = builder.with_region(&config.region);
        }
        if !config.access_key.is_empty() {
            builder = builder
                .with_access_key_id(&config.access_key)
                .with_secret_access_key(&config.secret_key);
        }
        if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| Error::InvalidInput(format!("Failed to configure S3 client: {}", e)))?;

        Ok(Self::with_store(Arc::new(store), config.bucket.clone()))
    }

    /// Wrap an existing object store, e.g. `object_store::memory::InMemory`.
    pub fn with_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    fn locator(&self, path: &Path) -> String {
        format!("s3://{}/{}", self.bucket, path)
    }
}

/// Map a name onto an object path, refusing names the path would alter.
fn object_path(name: &str) -> Result<Path> {
    match Path::parse(name) {
        Ok(path) if !name.is_empty() && path.as_ref() == name => Ok(path),
        _ => Err(Error::InvalidInput(format!(
            "'{}' cannot be stored verbatim as an object key \
             (empty name, leading, trailing or repeated '/', '.' or '..' segment, \
             or control character)",
            name.escape_debug()
        ))),
    }
}

fn store_error(err: object_store::Error, identifier: &str) -> Error {
    match err {
        object_store::Error::NotFound { .. } => Error::NotFound(identifier.to_string()),
        other => Error::Transport(other.to_string()),
    }
}

/// Create a client from the `aws` credential block.
pub fn create_s3_client(credentials: &CredentialBlock) -> Result<Arc<dyn StorageClient>> {
    let config = S3Config::from_credentials(credentials)?;
    Ok(Arc::new(S3Client::new(&config)?))
}

#[async_trait]
impl StorageClient for S3Client {
    fn provider(&self) -> ProviderId {
        ProviderId::Aws
    }

    async fn upload(&self, name: &str, mut data: ByteStream) -> Result<UploadReceipt> {
        let path = object_path(name)?;
        let mut writer = BufWriter::new(self.store.clone(), path.clone());
        let mut size = 0u64;

        while let Some(chunk) = data.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(e);
                }
            };
            size += chunk.len() as u64;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;
        }
        writer
            .shutdown()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        debug!(bucket = %self.bucket, key = %path, size, "Uploaded object");
        Ok(UploadReceipt {
            identifier: path.to_string(),
            locator: self.locator(&path),
        })
    }

    async fn list(&self) -> Result<Vec<BlobDescriptor>> {
        let blobs: Vec<BlobDescriptor> = self
            .store
            .list(None)
            .map_ok(|meta| BlobDescriptor::new(meta.location.to_string(), meta.size as u64))
            .try_collect()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        debug!(bucket = %self.bucket, count = blobs.len(), "Listed objects");
        Ok(blobs)
    }

    async fn download(&self, identifier: &str) -> Result<Vec<u8>> {
        let path = object_path(identifier)?;
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| store_error(e, identifier))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| store_error(e, identifier))?;

        debug!(bucket = %self.bucket, key = %path, size = bytes.len(), "Downloaded object");
        Ok(bytes.to_vec())
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        let path = object_path(identifier)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!(bucket = %self.bucket, key = %path, "Deleted object");
                Ok(())
            }
            Err(e) => Err(Error::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::bytes_stream;
    use bytes::Bytes;
    use futures::stream;
    use object_store::memory::InMemory;

    fn client() -> S3Client {
        S3Client::with_store(Arc::new(InMemory::new()), "test-bucket")
    }

    fn credentials(pairs: &[(&str, &str)]) -> CredentialBlock {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_greeting_scenario() {
        let client = client();

        let receipt = client
            .upload("greeting.txt", bytes_stream(&b"hello"[..]))
            .await
            .unwrap();
        assert_eq!(receipt.identifier, "greeting.txt");
        assert_eq!(receipt.locator, "s3://test-bucket/greeting.txt");

        let listed = client.list().await.unwrap();
        assert!(listed.contains(&BlobDescriptor::new("greeting.txt", 5)));

        assert_eq!(client.download("greeting.txt").await.unwrap(), b"hello");

        client.delete("greeting.txt").await.unwrap();
        let listed = client.list().await.unwrap();
        assert!(listed.iter().all(|b| b.key != "greeting.txt"));
    }

    #[tokio::test]
    async fn test_binary_round_trip() {
        let client = client();
        let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        let chunks: Vec<Result<Bytes>> = payload
            .chunks(4096)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        let receipt = client
            .upload("data/blob.bin", Box::pin(stream::iter(chunks)))
            .await
            .unwrap();

        assert_eq!(client.download(&receipt.identifier).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_list_sizes() {
        let client = client();
        let sizes = [0usize, 1, 17, 1024];
        for (i, size) in sizes.iter().enumerate() {
            client
                .upload(&format!("file-{}", i), bytes_stream(vec![0u8; *size]))
                .await
                .unwrap();
        }

        let mut listed = client.list().await.unwrap();
        listed.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(listed.len(), sizes.len());
        for (i, size) in sizes.iter().enumerate() {
            assert_eq!(listed[i], BlobDescriptor::new(format!("file-{}", i), *size as u64));
        }
    }

    #[tokio::test]
    async fn test_download_missing() {
        let err = client().download("absent.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(key) if key == "absent.txt"));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        client().delete("absent.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_listed_keys_round_trip() {
        let client = client();
        client
            .upload("report 100%.txt", bytes_stream(&b"x"[..]))
            .await
            .unwrap();

        let listed = client.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(client.download(&listed[0].key).await.unwrap(), b"x");

        client.delete(&listed[0].key).await.unwrap();
        assert!(client.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_distinct_names_never_share_a_key() {
        let client = client();
        client.upload("a", bytes_stream(&b"one"[..])).await.unwrap();

        let err = client.upload("/a", bytes_stream(&b"two"[..])).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(client.download("a").await.unwrap(), b"one");

        let keys: Vec<String> = client.list().await.unwrap().into_iter().map(|b| b.key).collect();
        assert_eq!(keys, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_names_that_would_be_rewritten() {
        let client = client();
        for name in ["", "/a", "dir/", "x//y", "../etc", "a/./b", "tab\tname"] {
            let result = client.upload(name, bytes_stream(&b"x"[..])).await;
            assert!(
                matches!(result, Err(Error::InvalidInput(_))),
                "{:?} was accepted",
                name
            );
            assert!(matches!(client.download(name).await, Err(Error::InvalidInput(_))));
            assert!(matches!(client.delete(name).await, Err(Error::InvalidInput(_))));
        }
        assert!(client.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nested_name_stored_verbatim() {
        let client = client();
        let receipt = client
            .upload("x/y/z.txt", bytes_stream(&b"deep"[..]))
            .await
            .unwrap();
        assert_eq!(receipt.identifier, "x/y/z.txt");
        assert_eq!(receipt.locator, "s3://test-bucket/x/y/z.txt");
    }

    #[tokio::test]
    async fn test_upload_stream_error_propagates() {
        let client = client();
        let data: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(Error::Io(std::io::Error::other("disk gone"))),
        ]));

        let err = client.upload("broken.bin", data).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(matches!(
            client.download("broken.bin").await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_create_from_credentials() {
        let client = create_s3_client(&credentials(&[
            ("bucket", "photos"),
            ("region", "eu-west-1"),
            ("access_key", "AKIDEXAMPLE"),
            ("secret_key", "secret"),
        ]))
        .unwrap();
        assert_eq!(client.provider(), ProviderId::Aws);
    }

    #[test]
    fn test_create_requires_bucket() {
        let result = create_s3_client(&credentials(&[("bucket", ""), ("region", "eu-west-1")]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = create_s3_client(&credentials(&[("region", "eu-west-1")]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_create_ignores_extra_non_string_fields() {
        let mut block = credentials(&[("bucket", "photos"), ("region", "eu-west-1")]);
        block.insert("port".to_string(), Value::from(9000));

        let client = create_s3_client(&block).unwrap();
        assert_eq!(client.provider(), ProviderId::Aws);

        block.insert("bucket".to_string(), Value::from(7));
        assert!(matches!(create_s3_client(&block), Err(Error::InvalidInput(_))));
    }
}
