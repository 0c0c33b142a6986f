//! Route table for the StudyShare API.
//!
//! ## Structure
//! - **Catalog endpoints** (under `/api/resources`)
//!   - `POST   /api/resources/upload` — authenticated multipart upload
//!   - `GET    /api/resources` — list the catalog, newest first
//!   - `GET    /api/resources/{id}` — fetch one resource
//!   - `PUT    /api/resources/{id}/download` — count a download
//!   - `GET    /api/resources/{id}/download-url` — authenticated forced-attachment URL
//!   - `DELETE /api/resources/{id}` — owner-gated delete
//!
//! - **Health endpoints**
//!   - `GET /healthz`, `GET /readyz`
//!
//! The router carries shared state (`AppState`) to all handlers.

use crate::handlers::{
    AppState,
    health_handlers::{healthz, readyz},
    resource_handlers::{
        delete_resource, download_url, get_resource, list_resources, record_download,
        upload_resource,
    },
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};

/// Multipart form overhead allowed on top of the file size cap. Files over
/// the cap are rejected with a 400 by the pipeline itself rather than a 413
/// from the body limit.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build and return the router for all API routes.
pub fn routes(max_upload_bytes: usize, cors_origin: Option<&str>) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // resource catalog
        .route("/api/resources/upload", post(upload_resource))
        .route("/api/resources", get(list_resources))
        .route(
            "/api/resources/{id}",
            get(get_resource).delete(delete_resource),
        )
        .route("/api/resources/{id}/download", put(record_download))
        .route("/api/resources/{id}/download-url", get(download_url))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ))
        .layer(cors_layer(cors_origin))
}

/// CORS policy for the browser frontend.
///
/// A configured origin gets credentials mode with the headers the frontend
/// sends; with none configured the API stays permissive for local
/// development.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    match origin.and_then(|value| value.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
            .allow_credentials(true)
            .allow_origin(origin),
        None => CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any),
    }
}
