//! StudyShare backend — a study-resource sharing API.
//!
//! Users authenticate with identity-provider tokens, upload files to an
//! external object-storage provider, browse the shared catalog, and delete
//! their own uploads. Modules are exposed as a library so the integration
//! tests can assemble the router in-process.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
