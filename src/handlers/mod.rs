//! HTTP layer: shared router state and the request handlers.

pub mod health_handlers;
pub mod resource_handlers;

use crate::services::{auth::AuthVerifier, resource_service::ResourceService};
use std::sync::Arc;

/// State shared by every handler.
///
/// Both members are constructed once at process start and injected here;
/// nothing in the handlers reaches for ambient globals.
#[derive(Clone)]
pub struct AppState {
    /// Resource catalog lifecycle (upload, accounting, delete).
    pub resources: ResourceService,

    /// Bearer-token verifier for the identity provider's tokens.
    pub auth: Arc<AuthVerifier>,
}
