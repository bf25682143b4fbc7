//! Cloudinary REST API client.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use blobswitch_common::{Error, Result};

use super::auth::{timestamp, Credentials};

/// Upload and admin API base URL.
pub const API_BASE: &str = "https://api.cloudinary.com";
/// Public delivery base URL.
pub const DELIVERY_BASE: &str = "https://res.cloudinary.com";

const BOUNDARY: &str = "BlobswitchFormBoundary7MA4YWxkTrZu0gW";

/// Characters escaped inside a public ID when building a delivery URL.
/// `/` is kept: it separates folders in public IDs.
const PUBLIC_ID: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Asset returned by the upload API.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub bytes: u64,
}

/// Asset entry of an admin listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub public_id: String,
    #[serde(default)]
    pub bytes: u64,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// HTTP client bound to one Cloudinary account and resource type.
pub struct MediaClient {
    http: Client,
    credentials: Credentials,
    resource_type: String,
    api_base: String,
    delivery_base: String,
}

impl MediaClient {
    /// Create a client against the public Cloudinary endpoints.
    pub fn new(credentials: Credentials, resource_type: impl Into<String>) -> Result<Self> {
        Self::with_endpoints(credentials, resource_type, API_BASE, DELIVERY_BASE)
    }

    /// Create a client against custom endpoints.
    ///
    /// # Errors
    /// - `InvalidInput` if a base URL does not parse
    /// - `Transport` if the HTTP client cannot be initialized
    pub fn with_endpoints(
        credentials: Credentials,
        resource_type: impl Into<String>,
        api_base: &str,
        delivery_base: &str,
    ) -> Result<Self> {
        for base in [api_base, delivery_base] {
            Url::parse(base)
                .map_err(|e| Error::InvalidInput(format!("Invalid base URL '{}': {}", base, e)))?;
        }

        let http = Client::builder()
            .user_agent("blobswitch/0.1")
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            resource_type: resource_type.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            delivery_base: delivery_base.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.api_base, self.credentials.cloud_name, self.resource_type, action
        )
    }

    /// Public delivery URL of an asset.
    pub fn delivery_url(&self, public_id: &str) -> String {
        format!(
            "{}/{}/{}/upload/{}",
            self.delivery_base,
            self.credentials.cloud_name,
            self.resource_type,
            utf8_percent_encode(public_id, PUBLIC_ID)
        )
    }

    /// Upload an asset under a caller-assigned public ID.
    pub async fn upload(&self, public_id: &str, data: Vec<u8>) -> Result<UploadedAsset> {
        check_public_id(public_id)?;
        let params = self.credentials.signed_params(vec![
            ("public_id".to_string(), public_id.to_string()),
            ("timestamp".to_string(), timestamp()),
        ]);
        let filename = public_id.rsplit('/').next().unwrap_or(public_id);
        let body = multipart_body(&params, Some((filename, &data)));

        let response = self
            .http
            .post(self.api_url("upload"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to upload asset: {}", e)))?;

        self.handle_response(response).await
    }

    /// List up to `max_results` assets of the configured resource type.
    pub async fn list_resources(&self, max_results: u32) -> Result<Vec<Resource>> {
        let url = format!(
            "{}/v1_1/{}/resources/{}",
            self.api_base, self.credentials.cloud_name, self.resource_type
        );

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.api_key, Some(self.credentials.api_secret()))
            .query(&[("max_results", max_results.to_string())])
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to list assets: {}", e)))?;

        let list: ResourceList = self.handle_response(response).await?;
        Ok(list.resources)
    }

    /// Destroy an asset by public ID.
    ///
    /// Returns `true` if an asset was removed, `false` if none existed.
    pub async fn destroy(&self, public_id: &str) -> Result<bool> {
        check_public_id(public_id)?;
        let params = self.credentials.signed_params(vec![
            ("public_id".to_string(), public_id.to_string()),
            ("timestamp".to_string(), timestamp()),
        ]);

        let response = self
            .http
            .post(self.api_url("destroy"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(&params, None))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to destroy asset: {}", e)))?;

        let destroyed: DestroyResponse = self.handle_response(response).await?;
        match destroyed.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => Err(Error::Transport(format!(
                "Unexpected destroy result for '{}': {}",
                public_id, other
            ))),
        }
    }

    /// Fetch the raw bytes of an asset through its delivery URL.
    pub async fn fetch(&self, public_id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.delivery_url(public_id))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to fetch asset: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(public_id.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "Failed to fetch asset '{}': {}",
                public_id, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read asset body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    /// Handle API response with error checking.
    async fn handle_response<T: serde::de::DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Transport(format!("Failed to parse response: {}", e)))
        } else if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound("Resource not found".to_string()))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(Error::Transport(format!(
                "Authentication failed for cloud '{}'",
                self.credentials.cloud_name
            )))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Transport(format!("API error: {} - {}", status, body)))
        }
    }
}

/// Reject public IDs containing CR or LF. Form fields are written
/// unescaped, so a line break could forge a part boundary.
fn check_public_id(public_id: &str) -> Result<()> {
    if public_id.contains(['\r', '\n']) {
        return Err(Error::InvalidInput(format!(
            "Public ID '{}' contains a line break",
            public_id.escape_debug()
        )));
    }
    Ok(())
}

/// Build a `multipart/form-data` body from text fields and an optional file.
fn multipart_body(fields: &[(String, String)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((filename, data)) = file {
        let filename = filename.replace('"', "%22");
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
