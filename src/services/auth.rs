//! Bearer-token verification.
//!
//! Tokens are issued by the external identity provider; this service only
//! verifies them and extracts the caller's identity. Verification failures
//! carry no detail to the caller beyond "invalid token".

use axum::http::{HeaderMap, header::AUTHORIZATION};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no authentication token provided")]
    MissingToken,
    #[error("invalid authentication token")]
    InvalidToken,
}

/// Claims carried by identity-provider tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    /// Display name, when the provider knows one.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address, when the provider knows one.
    #[serde(default)]
    pub email: Option<String>,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
}

/// Verified caller identity.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    /// Display name snapshot recorded on uploads: name, then email, then
    /// the bare id.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Verifies bearer tokens against the identity provider's signing secret.
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Decode and validate a token, returning the caller identity.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            tracing::debug!("token verification failed: {err}");
            AuthError::InvalidToken
        })?;

        Ok(Identity {
            id: data.claims.sub,
            name: data.claims.name,
            email: data.claims.email,
        })
    }

    /// Extract the `Authorization: Bearer` token from request headers and
    /// verify it.
    pub fn verify_request(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.verify(token)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
