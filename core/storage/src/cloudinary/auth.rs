//! Account credentials and request signing for Cloudinary.

use chrono::Utc;
use sha1::{Digest, Sha1};
use std::fmt;
use zeroize::Zeroizing;

use blobswitch_common::{Error, Result};

/// Account credentials for the upload and admin APIs.
#[derive(Clone)]
pub struct Credentials {
    pub cloud_name: String,
    pub api_key: String,
    api_secret: Zeroizing<String>,
}

impl Credentials {
    /// # Errors
    /// - `InvalidInput` if the cloud name is empty (no URL can be built)
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self> {
        let cloud_name = cloud_name.into();
        if cloud_name.is_empty() {
            return Err(Error::InvalidInput(
                "cloudinary cloud_name is not configured".to_string(),
            ));
        }

        Ok(Self {
            cloud_name,
            api_key: api_key.into(),
            api_secret: Zeroizing::new(api_secret.into()),
        })
    }

    pub(crate) fn api_secret(&self) -> &str {
        &self.api_secret
    }

    /// Sign request parameters and return them with `api_key` and
    /// `signature` appended, ready to be sent as form fields.
    pub fn signed_params(&self, mut params: Vec<(String, String)>) -> Vec<(String, String)> {
        let signature = sign(&params, self.api_secret());
        params.push(("api_key".to_string(), self.api_key.clone()));
        params.push(("signature".to_string(), signature));
        params
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Compute a request signature.
///
/// Parameters with empty values are skipped, the rest are sorted by name,
/// serialized as `name=value` joined with `&`, suffixed with the API secret
/// and hashed with SHA-1.
pub fn sign(params: &[(String, String)], api_secret: &str) -> String {
    let mut pairs: Vec<&(String, String)> =
        params.iter().filter(|(_, value)| !value.is_empty()).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let to_sign = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Current UNIX timestamp, as sent in signed requests.
pub fn timestamp() -> String {
    Utc::now().timestamp().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sign_documented_example() {
        let signature = sign(
            &params(&[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ]),
            "abcd",
        );
        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn test_sign_ignores_order_and_empty_values() {
        let a = sign(&params(&[("public_id", "x"), ("timestamp", "1")]), "s");
        let b = sign(
            &params(&[("timestamp", "1"), ("folder", ""), ("public_id", "x")]),
            "s",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn test_sign_depends_on_secret() {
        let p = params(&[("public_id", "x")]);
        assert_ne!(sign(&p, "one"), sign(&p, "two"));
    }

    #[test]
    fn test_signed_params() {
        let creds = Credentials::new("demo", "1234", "secret").unwrap();
        let signed = creds.signed_params(params(&[("public_id", "cat"), ("timestamp", "10")]));

        let names: Vec<&str> = signed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["public_id", "timestamp", "api_key", "signature"]);
        assert_eq!(signed[2].1, "1234");
        assert_eq!(
            signed[3].1,
            sign(&params(&[("public_id", "cat"), ("timestamp", "10")]), "secret")
        );
    }

    #[test]
    fn test_credentials_require_cloud_name() {
        assert!(matches!(
            Credentials::new("", "k", "s"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("demo", "1234", "top-secret").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("demo"));
    }

    #[test]
    fn test_timestamp_is_numeric() {
        assert!(timestamp().parse::<i64>().unwrap() > 1_600_000_000);
    }
}
