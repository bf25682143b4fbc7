//! Common types used throughout blobswitch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a supported storage provider.
///
/// The set is closed: every variant has a backend implementation
/// registered by the default provider registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Key/bucket-addressed object storage (Amazon S3 and compatibles).
    Aws,
    /// Asset-ID-addressed media service (Cloudinary).
    Cloudinary,
}

impl ProviderId {
    /// All known providers, in declaration order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Aws, ProviderId::Cloudinary];

    /// Name used in the configuration document and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Aws => "aws",
            ProviderId::Cloudinary => "cloudinary",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownProvider(s.to_string()))
    }
}

/// Read-only summary of a stored object, produced by listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDescriptor {
    /// Identifier, unique within the provider's namespace.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
}

impl BlobDescriptor {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// Result of a successful upload.
///
/// Every backend returns the same shape: `identifier` can be handed back to
/// `download`/`delete` on the same provider, while `locator` names where the
/// provider put the object (an `s3://` URI or a delivery URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub identifier: String,
    pub locator: String,
}
