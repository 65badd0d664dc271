// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Provider Adapter
//!
//! [`IdentityProvider`] is the capability set the rest of the gateway relies
//! on. The concrete [`FirebaseAuth`] client is injected at startup; tests
//! substitute an in-memory fake.
//!
//! Every operation is a single provider call. Nothing is retried and no
//! identity data is cached here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::AuthError;

pub mod credentials;
pub mod firebase;

#[cfg(test)]
pub(crate) mod fake;

pub use credentials::{AccessTokenSource, CredentialsError, ServiceAccountKey};
pub use firebase::FirebaseAuth;

/// Provider-stored key/value attributes attached to a user's ID token.
pub type CustomClaims = Map<String, Value>;

/// Maximum serialized size of a custom claims payload.
pub const MAX_CLAIMS_PAYLOAD: usize = 1000;

/// Claim names the provider reserves for its own tokens.
const RESERVED_CLAIMS: [&str; 16] = [
    "acr", "amr", "at_hash", "aud", "auth_time", "azp", "cnf", "c_hash", "exp", "firebase", "iat",
    "iss", "jti", "nbf", "nonce", "sub",
];

/// Result of a successful sign-up or sign-in, in the provider's wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationResult {
    #[serde(rename = "localId")]
    pub id: String,
    #[serde(rename = "idToken")]
    pub token: String,
    pub email: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("unable to {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    /// Network, encoding or decoding failure.
    #[error("unable to {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("unable to validate token: {0}")]
    InvalidToken(#[from] AuthError),

    #[error("signing keys unavailable: {0}")]
    SigningKeys(AuthError),

    #[error("no user record found for {0}")]
    UserNotFound(String),

    #[error("invalid custom claims: {0}")]
    InvalidClaims(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("service account credentials: {0}")]
    Credentials(#[from] CredentialsError),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and return its first session.
    async fn sign_up(&self, email: &str, password: &str)
        -> Result<AuthenticationResult, ProviderError>;

    /// Exchange email and password for a session.
    async fn sign_in(&self, email: &str, password: &str)
        -> Result<AuthenticationResult, ProviderError>;

    /// Verify an ID token and return the subject identifier it was issued to.
    async fn validate_token(&self, token: &str) -> Result<String, ProviderError>;

    async fn delete_user(&self, uid: &str) -> Result<(), ProviderError>;

    /// Return the uid of the account registered under `email`.
    async fn exist_by_email(&self, email: &str) -> Result<String, ProviderError>;

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), ProviderError>;

    async fn update_email(&self, uid: &str, email: &str) -> Result<(), ProviderError>;

    async fn set_custom_claims(&self, uid: &str, claims: &CustomClaims)
        -> Result<(), ProviderError>;

    async fn get_custom_claims(&self, uid: &str) -> Result<CustomClaims, ProviderError>;

    /// Readiness of the provider dependencies this adapter needs.
    async fn check_ready(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Reject claim sets the provider would refuse to embed in a token.
pub fn validate_custom_claims(claims: &CustomClaims) -> Result<(), ProviderError> {
    if let Some(key) = claims.keys().find(|k| RESERVED_CLAIMS.contains(&k.as_str())) {
        return Err(ProviderError::InvalidClaims(format!(
            "claim \"{key}\" is reserved"
        )));
    }

    let payload = serde_json::to_string(claims)
        .map_err(|e| ProviderError::InvalidClaims(e.to_string()))?;
    if payload.len() > MAX_CLAIMS_PAYLOAD {
        return Err(ProviderError::InvalidClaims(format!(
            "serialized claims must not exceed {MAX_CLAIMS_PAYLOAD} characters"
        )));
    }

    Ok(())
}

/// Provider uids are non-empty strings of at most 128 characters.
pub fn validate_uid(uid: &str) -> Result<(), ProviderError> {
    if uid.is_empty() || uid.chars().count() > 128 {
        return Err(ProviderError::InvalidArgument(
            "uid must be a non-empty string of at most 128 characters".to_string(),
        ));
    }
    Ok(())
}
