//! Cloudinary upload API client.
//!
//! Requests are signed: the signed parameters are sorted by name, joined as
//! `k=v` pairs with `&`, suffixed with the API secret and hashed with SHA-256.
//! `file`, `api_key`, `resource_type` and `cloud_name` are never signed.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, instrument};

use vitrine_core::ImageUpload;

use super::{AssetError, AssetStore, DeleteOutcome, StoredAsset};
use crate::config::CloudinaryConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Cloudinary client for image upload and deletion.
#[derive(Clone)]
pub struct CloudinaryClient {
    /// HTTP client.
    client: Client,
    /// `{api_base}/{cloud_name}`, no trailing slash.
    endpoint: String,
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl CloudinaryClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::NotConfigured` if the cloud name or API key is blank.
    pub fn new(config: &CloudinaryConfig) -> Result<Self, AssetError> {
        if config.cloud_name.trim().is_empty() {
            return Err(AssetError::NotConfigured("cloud name is empty".to_owned()));
        }
        if config.api_key.trim().is_empty() {
            return Err(AssetError::NotConfigured("API key is empty".to_owned()));
        }

        Ok(Self {
            client: Client::new(),
            endpoint: format!(
                "{}/{}",
                config.api_base.as_str().trim_end_matches('/'),
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Signature over `params` for this account.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_unstable_by_key(|(k, _)| *k);

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn signed_form(&self, params: &[(&str, &str)]) -> Form {
        let signature = self.sign(params);
        let form = params
            .iter()
            .fold(Form::new(), |form, (k, v)| form.text((*k).to_owned(), (*v).to_owned()));
        form.text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        form: Form,
    ) -> Result<T, AssetError> {
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AssetError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssetError::Response(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or_else(|_| format!("HTTP {status}"), |e| e.error.message);
            error!(status = %status, error = %message, "Cloudinary API error");
            return Err(AssetError::Api(message));
        }

        serde_json::from_str(&body).map_err(|e| AssetError::Response(e.to_string()))
    }
}

#[async_trait]
impl AssetStore for CloudinaryClient {
    #[instrument(skip(self, upload), fields(filename = %upload.filename, size = upload.len()))]
    async fn upload(&self, upload: &ImageUpload, folder: &str) -> Result<StoredAsset, AssetError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let form = self.signed_form(&[("folder", folder), ("timestamp", &timestamp)]);

        let mut part = Part::bytes(upload.bytes.clone()).file_name(upload.filename.clone());
        if let Some(content_type) = &upload.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AssetError::Request(e.to_string()))?;
        }

        let result: UploadResponse = self
            .send(format!("{}/auto/upload", self.endpoint), form.part("file", part))
            .await?;

        debug!(public_id = %result.public_id, "Uploaded asset");

        Ok(StoredAsset {
            url: result.secure_url,
            store_id: result.public_id,
        })
    }

    #[instrument(skip(self))]
    async fn destroy(&self, store_id: &str) -> Result<DeleteOutcome, AssetError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let form = self.signed_form(&[("public_id", store_id), ("timestamp", &timestamp)]);

        let result: DestroyResponse = self
            .send(format!("{}/image/destroy", self.endpoint), form)
            .await?;

        match result.result.as_str() {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not found" => Ok(DeleteOutcome::AlreadyAbsent),
            other => Err(AssetError::Api(format!("unexpected destroy result: {other}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;

    fn client(cloud_name: &str, api_key: &str) -> Result<CloudinaryClient, AssetError> {
        CloudinaryClient::new(&CloudinaryConfig {
            cloud_name: cloud_name.to_owned(),
            api_key: api_key.to_owned(),
            api_secret: SecretString::from("abcd"),
            api_base: Url::parse("https://api.cloudinary.com/v1_1/").unwrap(),
            upload_folder: "shop-products".to_owned(),
        })
    }

    #[test]
    fn test_signature_sorts_params_and_appends_secret() {
        let client = client("demo", "1234").unwrap();
        let signature = client.sign(&[("timestamp", "1315060510"), ("public_id", "sample")]);

        let expected = hex::encode(Sha256::digest(b"public_id=sample&timestamp=1315060510abcd"));
        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_endpoint_has_no_double_slash() {
        let client = client("demo", "1234").unwrap();
        assert_eq!(client.endpoint, "https://api.cloudinary.com/v1_1/demo");
    }

    #[test]
    fn test_blank_config_is_rejected() {
        assert!(matches!(client(" ", "1234"), Err(AssetError::NotConfigured(_))));
        assert!(matches!(client("demo", ""), Err(AssetError::NotConfigured(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", client("demo", "1234").unwrap());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("abcd"));
    }
}
