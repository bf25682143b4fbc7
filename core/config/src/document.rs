//! Configuration document and credential field table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use blobswitch_common::{Error, ProviderId, Result};

use crate::env::EnvSource;

/// Named credential fields of one provider (e.g. `region`, `api_key`).
///
/// Values are kept as parsed JSON; backends read the fields they need as
/// strings when they are constructed.
pub type CredentialBlock = Map<String, Value>;

/// A credential field a provider understands, with the environment
/// variable that overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialField {
    /// Key inside the provider's credential block.
    pub name: &'static str,
    /// Environment variable taking precedence over the persisted value.
    pub env: &'static str,
}

const AWS_FIELDS: &[CredentialField] = &[
    CredentialField { name: "bucket", env: "bucketAWS" },
    CredentialField { name: "region", env: "regionAWS" },
    CredentialField { name: "access_key", env: "accessKeyAWS" },
    CredentialField { name: "secret_key", env: "secretKeyAWS" },
];

const CLOUDINARY_FIELDS: &[CredentialField] = &[
    CredentialField { name: "cloud_name", env: "cloudnameCLOUDINARY" },
    CredentialField { name: "api_key", env: "apikeyCLOUDINARY" },
    CredentialField { name: "api_secret", env: "apisecretCLOUDINARY" },
];

/// Credential fields recognized for a provider.
pub fn credential_fields(id: ProviderId) -> &'static [CredentialField] {
    match id {
        ProviderId::Aws => AWS_FIELDS,
        ProviderId::Cloudinary => CLOUDINARY_FIELDS,
    }
}

/// The persisted configuration document.
///
/// On disk this is a JSON object with an `active_provider` string and one
/// object per provider:
///
/// ```json
/// {
///   "active_provider": "aws",
///   "aws": { "bucket": "b", "region": "us-east-1", "access_key": "", "secret_key": "" },
///   "cloudinary": { "cloud_name": "demo", "api_key": "", "api_secret": "" }
/// }
/// ```
///
/// `active_provider` is kept as a raw string: an unrecognized value can be
/// persisted and only fails when a client is constructed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub active_provider: String,
    /// Every other top-level field: the credential blocks keyed by provider
    /// name, plus anything else the file carries, written back unchanged.
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

impl ConfigDocument {
    /// Create a document with empty credential blocks for every known provider.
    pub fn new(active: ProviderId) -> Self {
        let sections = ProviderId::ALL
            .into_iter()
            .map(|id| {
                let block: CredentialBlock = credential_fields(id)
                    .iter()
                    .map(|field| (field.name.to_string(), Value::String(String::new())))
                    .collect();
                (id.as_str().to_string(), Value::Object(block))
            })
            .collect();

        Self {
            active_provider: active.as_str().to_string(),
            sections,
        }
    }

    /// Credential block for a provider, if the document has one.
    ///
    /// A section that is present but not a JSON object counts as missing.
    pub fn credentials(&self, id: ProviderId) -> Option<&CredentialBlock> {
        self.sections.get(id.as_str()).and_then(Value::as_object)
    }

    /// Mutable credential block for a provider, if the document has one.
    pub fn credentials_mut(&mut self, id: ProviderId) -> Option<&mut CredentialBlock> {
        self.sections.get_mut(id.as_str()).and_then(Value::as_object_mut)
    }

    /// Overlay environment values onto every known credential field.
    ///
    /// A present, non-empty variable wins. Otherwise the persisted value is
    /// kept, and a field missing from the file is materialized as an empty
    /// string so backends always see the full field set. A provider section
    /// that exists but is not an object is left untouched.
    pub fn apply_env(&mut self, env: &dyn EnvSource) {
        for id in ProviderId::ALL {
            self.sections
                .entry(id.as_str())
                .or_insert_with(|| Value::Object(Map::new()));
            let Some(block) = self.credentials_mut(id) else {
                warn!(provider = %id, "Credential section is not an object, skipping overrides");
                continue;
            };

            for field in credential_fields(id) {
                match env.var(field.env).filter(|value| !value.is_empty()) {
                    Some(value) => {
                        block.insert(field.name.to_string(), Value::String(value));
                    }
                    None => {
                        block
                            .entry(field.name)
                            .or_insert_with(|| Value::String(String::new()));
                    }
                }
            }
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::ConfigUnavailable(e.to_string()))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
