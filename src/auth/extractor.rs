// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the identity attached by [`require_bearer`].
//!
//! ```rust,ignore
//! async fn my_handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
//!     // user.user_id is the provider uid
//! }
//! ```
//!
//! [`require_bearer`]: super::middleware::require_bearer

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{AuthError, AuthenticatedUser};
use crate::{service::ErrorKind, state::AppState};

/// Extractor for the authenticated user.
///
/// Only succeeds behind the authorization middleware; without it the request
/// is rejected with `401`.
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Extractor that requires the `admin: true` custom claim.
///
/// Claims are read from the provider on every request so revocations apply
/// immediately.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        let is_admin = match state.service.is_admin(&user.user_id).await {
            Ok(is_admin) => is_admin,
            // Token still valid but the account is gone.
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(user_id = %user.user_id, error = %e, "failed to read admin claim");
                return Err(AuthError::InternalError(e.to_string()));
            }
        };

        if !is_admin {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}
