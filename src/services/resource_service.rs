//! src/services/resource_service.rs
//!
//! ResourceService — the resource catalog's upload, accounting, and deletion
//! lifecycle. Metadata lives in SQLite; file bytes live with the external
//! storage provider. The provider write is fully awaited before the metadata
//! insert begins, which is what makes cleanup of orphaned objects possible
//! when a later step fails.

use crate::models::resource::{Category, Resource, UnknownCategory};
use crate::services::attachment_url::force_attachment;
use crate::services::auth::Identity;
use crate::services::object_storage::{ObjectStorage, StorageError};
use bytes::Bytes;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// MIME types the upload pipeline accepts.
const ALLOWED_FILE_TYPES: [&str; 9] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/zip",
    "application/x-7z-compressed",
];

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource `{0}` not found")]
    NotFound(Uuid),
    #[error("not authorized to delete this resource")]
    NotOwner,
    #[error("no file uploaded")]
    MissingFile,
    #[error("file type `{0}` is not allowed")]
    DisallowedFileType(String),
    #[error("file too large, maximum size is {0} bytes")]
    FileTooLarge(u64),
    #[error("{0}")]
    Validation(String),
    #[error("upload failed: {0}")]
    UploadFailed(#[source] sqlx::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// One file received from the upload form, held in memory for the
/// pre-storage checks.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Descriptive form fields accompanying the file.
#[derive(Debug, Default, Clone)]
pub struct UploadFields {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub category: Option<String>,
}

/// Download target handed to clients driving the forced-attachment flow.
#[derive(Debug)]
pub struct DownloadTarget {
    pub download_url: String,
    pub file_name: String,
    pub file_type: String,
}

const RESOURCE_COLUMNS: &str = "id, title, description, subject, category, file_url, file_name, \
     file_type, file_size, storage_id, uploader_id, uploader_name, download_count, created_at";

/// ResourceService provides the catalog operations:
/// - Upload a resource (writes bytes to the provider, then inserts metadata)
/// - List / fetch resources
/// - Count downloads (atomic in-place increment)
/// - Resolve a forced-attachment download URL
/// - Delete a resource on behalf of its owner
#[derive(Clone)]
pub struct ResourceService {
    /// Shared SQLite connection pool for metadata operations.
    pub db: Arc<SqlitePool>,

    /// External object-storage provider.
    storage: Arc<dyn ObjectStorage>,

    /// Upper bound on accepted file size, in bytes.
    max_upload_bytes: u64,
}

impl ResourceService {
    pub fn new(db: Arc<SqlitePool>, storage: Arc<dyn ObjectStorage>, max_upload_bytes: u64) -> Self {
        Self {
            db,
            storage,
            max_upload_bytes,
        }
    }

    /// Run the upload pipeline for an authenticated caller.
    ///
    /// File checks (presence, type allowlist, size cap) run before any
    /// storage write. Field validation runs after the provider write, so a
    /// rejected form must release the object it just created. A failed
    /// metadata insert likewise cleans up the orphaned object before
    /// surfacing the error.
    pub async fn upload(
        &self,
        uploader: &Identity,
        file: Option<UploadedFile>,
        fields: UploadFields,
    ) -> ResourceResult<Resource> {
        let file = file.ok_or(ResourceError::MissingFile)?;
        if !ALLOWED_FILE_TYPES
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&file.content_type))
        {
            return Err(ResourceError::DisallowedFileType(file.content_type));
        }
        if file.data.len() as u64 > self.max_upload_bytes {
            return Err(ResourceError::FileTooLarge(self.max_upload_bytes));
        }

        let stored = self
            .storage
            .store(&file.name, &file.content_type, file.data)
            .await?;

        let category = match validate_fields(&fields) {
            Ok(category) => category,
            Err(err) => {
                self.cleanup_stored(stored.storage_id.as_deref()).await;
                return Err(err);
            }
        };

        let resource = Resource {
            id: Uuid::new_v4(),
            title: fields.title.trim().to_string(),
            description: fields.description,
            subject: fields.subject.trim().to_string(),
            category,
            file_url: stored.url,
            file_name: file.name,
            file_type: stored.content_type,
            file_size: stored.size,
            storage_id: stored.storage_id,
            uploader_id: uploader.id.clone(),
            uploader_name: uploader.display_name(),
            download_count: 0,
            created_at: Utc::now(),
        };

        let insert = sqlx::query(
            "INSERT INTO resources (id, title, description, subject, category, file_url, \
             file_name, file_type, file_size, storage_id, uploader_id, uploader_name, \
             download_count, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(resource.id)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.subject)
        .bind(resource.category)
        .bind(&resource.file_url)
        .bind(&resource.file_name)
        .bind(&resource.file_type)
        .bind(resource.file_size)
        .bind(&resource.storage_id)
        .bind(&resource.uploader_id)
        .bind(&resource.uploader_name)
        .bind(resource.download_count)
        .bind(resource.created_at)
        .execute(&*self.db)
        .await;

        if let Err(err) = insert {
            self.cleanup_stored(resource.storage_id.as_deref()).await;
            return Err(ResourceError::UploadFailed(err));
        }

        debug!(id = %resource.id, title = %resource.title, "resource created");
        Ok(resource)
    }

    /// All resources, newest first.
    pub async fn list(&self) -> ResourceResult<Vec<Resource>> {
        let resources = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY created_at DESC"
        ))
        .fetch_all(&*self.db)
        .await?;

        Ok(resources)
    }

    /// Fetch one resource by id.
    pub async fn get(&self, id: Uuid) -> ResourceResult<Resource> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => ResourceError::NotFound(id),
            other => ResourceError::Sqlx(other),
        })
    }

    /// Count one download and return the updated record.
    ///
    /// The increment happens in place in SQL, so concurrent downloads of the
    /// same resource cannot lose updates.
    pub async fn record_download(&self, id: Uuid) -> ResourceResult<Resource> {
        sqlx::query_as::<_, Resource>(&format!(
            "UPDATE resources SET download_count = download_count + 1 \
             WHERE id = ? RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => ResourceError::NotFound(id),
            other => ResourceError::Sqlx(other),
        })
    }

    /// Resolve the forced-attachment download target for a resource.
    pub async fn download_url(&self, id: Uuid) -> ResourceResult<DownloadTarget> {
        let resource = self.get(id).await?;

        Ok(DownloadTarget {
            download_url: force_attachment(&resource.file_url),
            file_name: resource.file_name,
            file_type: resource.file_type,
        })
    }

    /// Delete a resource owned by `caller`.
    ///
    /// The storage object goes first; losing that call leaves an orphan with
    /// the provider, which is logged rather than surfaced, and the metadata
    /// row is removed regardless. A concurrent delete of the same id is
    /// reported as NotFound by whichever call loses the race on the row.
    pub async fn delete(&self, id: Uuid, caller: &Identity) -> ResourceResult<()> {
        let resource = self.get(id).await?;
        if resource.uploader_id != caller.id {
            return Err(ResourceError::NotOwner);
        }

        if let Some(storage_id) = resource.storage_id.as_deref() {
            if let Err(err) = self.storage.delete(storage_id).await {
                warn!(
                    storage_id,
                    "storage delete failed, metadata will still be removed: {err}"
                );
            }
        }

        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ResourceError::NotFound(id));
        }

        debug!(%id, "resource deleted");
        Ok(())
    }

    /// Best-effort removal of a storage object after a failed upload.
    ///
    /// A failure here leaves an orphan with the provider; it is logged and
    /// swallowed so the primary error reaches the caller unobscured.
    async fn cleanup_stored(&self, storage_id: Option<&str>) {
        let Some(storage_id) = storage_id else { return };
        match self.storage.delete(storage_id).await {
            Ok(()) => debug!(storage_id, "cleaned up storage object after failed upload"),
            Err(err) => warn!(storage_id, "failed to clean up storage object: {err}"),
        }
    }
}

/// Check the descriptive fields and resolve the category.
fn validate_fields(fields: &UploadFields) -> ResourceResult<Category> {
    if fields.title.trim().is_empty() || fields.subject.trim().is_empty() {
        return Err(ResourceError::Validation(
            "title and subject are required fields".to_string(),
        ));
    }

    match fields.category.as_deref() {
        None | Some("") => Ok(Category::default()),
        Some(raw) => raw
            .parse()
            .map_err(|err: UnknownCategory| ResourceError::Validation(err.to_string())),
    }
}
