//! Client for the external object-storage provider.
//!
//! File bytes never touch local disk: uploads go straight to the provider's
//! HTTP API, which answers with a retrieval URL and an opaque object id used
//! later for deletion. The trait seam keeps the upload/delete lifecycle
//! testable without a network.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },
}

/// A stored object as reported back by the provider.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Retrieval URL for the uploaded bytes.
    pub url: String,
    /// Opaque id the provider accepts for deletion, when it returned one.
    pub storage_id: Option<String>,
    /// Stored size in bytes.
    pub size: i64,
    /// MIME type the object was stored with.
    pub content_type: String,
}

/// Operations the resource lifecycle needs from the object store.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload one file, returning its retrieval URL and object id.
    async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, StorageError>;

    /// Delete a previously stored object by its opaque id.
    async fn delete(&self, storage_id: &str) -> Result<(), StorageError>;
}

/// HTTP implementation talking to the hosted provider API.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

/// Provider response to a successful upload.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    #[serde(default)]
    public_id: Option<String>,
    #[serde(default)]
    bytes: Option<i64>,
}

/// Folder all uploads are filed under with the provider.
const UPLOAD_FOLDER: &str = "resources";

impl HttpObjectStorage {
    pub fn new(base_url: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
        }
    }

    /// Images go through the provider's default delivery pipeline; documents
    /// and archives go through its `raw` pipeline. The choice shows up in
    /// the retrieval URL the provider hands back.
    fn delivery_kind(content_type: &str) -> &'static str {
        if content_type.starts_with("image/") {
            "image"
        } else {
            "raw"
        }
    }

    async fn provider_error(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StorageError::Provider { status, message }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredObject, StorageError> {
        let endpoint = format!(
            "{}/{}/upload",
            self.base_url,
            Self::delivery_kind(content_type)
        );
        let fallback_size = data.len() as i64;

        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("folder", UPLOAD_FOLDER)
            .part("file", part);

        let response = self
            .client
            .post(&endpoint)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let body: UploadResponse = response.json().await?;
        tracing::debug!(
            url = %body.secure_url,
            storage_id = body.public_id.as_deref().unwrap_or("<none>"),
            "stored object with provider"
        );

        Ok(StoredObject {
            url: body.secure_url,
            storage_id: body.public_id,
            size: body.bytes.unwrap_or(fallback_size),
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, storage_id: &str) -> Result<(), StorageError> {
        let endpoint = format!("{}/destroy", self.base_url);
        let form = reqwest::multipart::Form::new().text("public_id", storage_id.to_string());

        let response = self
            .client
            .post(&endpoint)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        tracing::debug!(storage_id, "deleted object with provider");
        Ok(())
    }
}
