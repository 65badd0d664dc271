// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token claims and the authenticated user representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Claims carried by a provider-issued ID token.
///
/// Standard claims are validated by `jsonwebtoken`; everything else (the
/// `firebase` block, `email`, custom claims) lands in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Subject: the provider uid
    pub sub: String,

    /// Issuer (`https://securetoken.google.com/<project id>`)
    pub iss: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Time the user authenticated
    #[serde(default)]
    pub auth_time: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity resolved by the authorization middleware.
///
/// Inserted into the request extensions and read back through the
/// `CurrentUser` extractor; it lives only for the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Provider uid (`sub` claim of the bearer token)
    pub user_id: String,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
