//! Storage client trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt, TryStreamExt};
use std::fmt;
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use blobswitch_common::{BlobDescriptor, Error, ProviderId, Result, UploadReceipt};

/// Byte stream type for uploads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Wrap an in-memory payload as a single-chunk stream.
pub fn bytes_stream(data: impl Into<Bytes>) -> ByteStream {
    let data = data.into();
    Box::pin(stream::once(async move { Ok(data) }))
}

/// Stream the contents of an async reader (e.g. an open file).
pub fn reader_stream<R>(reader: R) -> ByteStream
where
    R: AsyncRead + Send + 'static,
{
    Box::pin(ReaderStream::new(reader).map_err(Error::from))
}

/// Drain a stream into a contiguous buffer.
pub async fn collect_stream(mut stream: ByteStream) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf)
}

/// Uniform client contract implemented by every storage backend.
///
/// A client is bound to one resolved provider configuration and is built
/// fresh for each operation. Construction never touches the network; all
/// I/O happens inside these methods. No method retries: failures are
/// returned to the caller as-is.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Provider this client talks to.
    fn provider(&self) -> ProviderId;

    /// Store a byte stream under `name`.
    ///
    /// # Postconditions
    /// - `receipt.identifier` addresses the object for `download`/`delete`
    ///
    /// # Errors
    /// - Stream errors are propagated unchanged
    /// - `Transport` for provider failures
    async fn upload(&self, name: &str, data: ByteStream) -> Result<UploadReceipt>;

    /// List stored objects in the backend's natural order.
    ///
    /// Backends may cap the number of results; see each implementation.
    async fn list(&self) -> Result<Vec<BlobDescriptor>>;

    /// Fetch the full content of an object.
    ///
    /// # Errors
    /// - `NotFound` if no object has this identifier
    /// - `Transport` for provider failures
    async fn download(&self, identifier: &str) -> Result<Vec<u8>>;

    /// Remove an object.
    ///
    /// Callers must tolerate both success and an error when the identifier
    /// does not exist.
    async fn delete(&self, identifier: &str) -> Result<()>;
}

impl fmt::Debug for dyn StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageClient(provider={})", self.provider())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bytes_stream_round_trip() {
        let data = collect_stream(bytes_stream(&b"hello"[..])).await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn test_reader_stream() {
        let reader = std::io::Cursor::new(vec![7u8; 10_000]);
        let data = collect_stream(reader_stream(reader)).await.unwrap();
        assert_eq!(data.len(), 10_000);
        assert!(data.iter().all(|b| *b == 7));
    }

    #[tokio::test]
    async fn test_collect_stream_propagates_errors() {
        let stream: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(Error::Transport("connection reset".to_string())),
        ]));

        let err = collect_stream(stream).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
