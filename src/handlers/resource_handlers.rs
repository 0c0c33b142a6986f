//! HTTP handlers for the resource catalog.
//!
//! Parses the multipart upload form and delegates the lifecycle to
//! `ResourceService`. Token verification happens here, at the edge, so the
//! service layer only ever sees verified identities.

use crate::{
    errors::AppError,
    handlers::AppState,
    services::resource_service::{UploadFields, UploadedFile},
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

/// POST `/api/resources/upload` — authenticated multipart upload.
///
/// Responds 201 with the created resource's id, title, file URL, and
/// creation time only; the full record is not echoed back.
pub async fn upload_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let identity = state.auth.verify_request(&headers)?;

    let (file, fields) = read_upload_form(multipart).await?;
    let resource = state.resources.upload(&identity, file, fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": resource.id,
            "title": resource.title,
            "fileUrl": resource.file_url,
            "createdAt": resource.created_at,
        })),
    ))
}

/// GET `/api/resources` — the whole catalog, newest first.
pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let resources = state.resources.list().await?;

    Ok(Json(json!({
        "count": resources.len(),
        "resources": resources,
    })))
}

/// GET `/api/resources/{id}` — one resource.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resources.get(id).await?;

    Ok(Json(json!({ "resource": resource })))
}

/// PUT `/api/resources/{id}/download` — count one download.
///
/// This is the explicit accounting endpoint: failures propagate normally.
pub async fn record_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resources.record_download(id).await?;

    Ok(Json(json!({
        "downloadCount": resource.download_count,
        "resource": resource,
    })))
}

/// GET `/api/resources/{id}/download-url` — authenticated forced-attachment
/// URL for the resource's file.
pub async fn download_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.verify_request(&headers)?;
    let target = state.resources.download_url(id).await?;

    // Resolving the URL means a forced download is about to start. Count it
    // off the critical path; the result is only logged and can never block
    // the caller from getting the URL.
    let resources = state.resources.clone();
    tokio::spawn(async move {
        if let Err(err) = resources.record_download(id).await {
            tracing::warn!(%id, "download count update failed: {err}");
        }
    });

    Ok(Json(json!({
        "downloadUrl": target.download_url,
        "fileName": target.file_name,
        "fileType": target.file_type,
    })))
}

/// DELETE `/api/resources/{id}` — owner-gated deletion.
pub async fn delete_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let identity = state.auth.verify_request(&headers)?;
    state.resources.delete(id, &identity).await?;

    Ok(Json(json!({ "message": "Resource deleted successfully" })))
}

/// Read the upload form: one `file` part plus the descriptive text fields.
///
/// A missing part content-type falls back to guessing from the filename;
/// unrecognized fields are ignored.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(Option<UploadedFile>, UploadFields), AppError> {
    let mut file = None;
    let mut fields = UploadFields::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_upload_form)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let content_type = match field.content_type() {
                    Some(value) => value.to_string(),
                    None => mime_guess::from_path(&file_name)
                        .first()
                        .map(|mime| mime.to_string())
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                };
                let data = field.bytes().await.map_err(bad_upload_form)?;

                file = Some(UploadedFile {
                    name: file_name,
                    content_type,
                    data,
                });
            }
            "title" => fields.title = field.text().await.map_err(bad_upload_form)?,
            "description" => fields.description = field.text().await.map_err(bad_upload_form)?,
            "subject" => fields.subject = field.text().await.map_err(bad_upload_form)?,
            "category" => fields.category = Some(field.text().await.map_err(bad_upload_form)?),
            _ => {}
        }
    }

    Ok((file, fields))
}

fn bad_upload_form(err: MultipartError) -> AppError {
    AppError::new(
        StatusCode::BAD_REQUEST,
        format!("malformed upload form: {err}"),
    )
}
