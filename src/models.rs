// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! Input fields default to empty when absent from the body; business rules
//! (such as "email is required") are checked by the service.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::provider::{AuthenticationResult, CustomClaims};

// =============================================================================
// Auth Inputs
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(default)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Registration request.
///
/// Only `email` is required. The name fields are accepted but not forwarded
/// to the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(default)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
}

impl SignUpInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.is_empty() {
            return Err("email is required".to_string());
        }
        Ok(())
    }
}

/// Password reset request; `/token/validate` reads only `token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(default)]
pub struct PasswordResetInput {
    pub email: String,
    pub password: String,
    /// ID token of the account whose password changes.
    pub token: String,
}

/// Optional account links on `POST /signup`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, PartialEq, Eq)]
#[into_params(parameter_in = Query)]
pub struct SignUpQuery {
    pub member_id: Option<String>,
    pub lodger_id: Option<String>,
}

// =============================================================================
// Auth Results
// =============================================================================

/// Session returned by sign-up and sign-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthResult {
    /// Provider user id.
    #[serde(rename = "localId")]
    pub local_id: String,
    /// ID token to send as `Authorization: Bearer <idToken>`.
    #[serde(rename = "idToken")]
    pub id_token: String,
    pub email: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    /// Token lifetime in seconds, as reported by the provider.
    #[serde(rename = "expiresIn")]
    pub expires_in: String,
}

impl From<AuthenticationResult> for AuthResult {
    fn from(result: AuthenticationResult) -> Self {
        Self {
            local_id: result.id,
            id_token: result.token,
            email: result.email,
            refresh_token: result.refresh_token,
            expires_in: result.expires_in,
        }
    }
}

// =============================================================================
// Account Models
// =============================================================================

/// Response for `GET /users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CurrentUserResponse {
    #[serde(rename = "localId")]
    pub local_id: String,
    #[serde(rename = "customClaims")]
    #[schema(value_type = Object)]
    pub custom_claims: CustomClaims,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(default)]
pub struct UpdateEmailRequest {
    pub email: String,
}

/// Response for `GET /admin/users`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserLookupResponse {
    #[serde(rename = "localId")]
    pub local_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, PartialEq, Eq)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct EmailQuery {
    pub email: String,
}
