// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only user management.
//!
//! Callers need a valid bearer token and the `admin: true` custom claim.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tracing::info;

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{EmailQuery, UserLookupResponse},
    provider::CustomClaims,
    state::AppState,
};

/// Resolve an email address to a user id.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(EmailQuery),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User found", body = UserLookupResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No user with this email"),
    )
)]
pub async fn find_user(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<UserLookupResponse>, ApiError> {
    let Query(query) = query?;
    info!(admin = %admin.user_id, email = %query.email, "admin user lookup");
    Ok(Json(state.service.find_user_by_email(&query.email).await?))
}

/// Replace a user's custom claims.
#[utoipa::path(
    put,
    path = "/admin/users/{uid}/claims",
    params(("uid" = String, Path, description = "Provider user id")),
    request_body(content = Object, description = "Custom claims object"),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Claims replaced"),
        (status = 400, description = "Malformed or reserved claims"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Caller is not an admin"),
    )
)]
pub async fn set_claims(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Path(uid): Path<String>,
    payload: Result<Json<CustomClaims>, JsonRejection>,
) -> Result<(), ApiError> {
    let Json(claims) = payload?;
    info!(admin = %admin.user_id, uid = %uid, "admin claims update");
    state.service.set_user_claims(&uid, claims).await?;
    Ok(())
}
