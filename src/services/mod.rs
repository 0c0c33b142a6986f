//! Service layer: token verification, object storage, URL rewriting, and
//! the resource lifecycle itself.

pub mod attachment_url;
pub mod auth;
pub mod object_storage;
pub mod resource_service;
