// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Self-service account endpoints. Require a bearer ID token.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::CurrentUser,
    error::ApiError,
    models::{CurrentUserResponse, UpdateEmailRequest},
    state::AppState,
};

/// Get the authenticated user's id and custom claims.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = CurrentUserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    Ok(Json(state.service.current_user(&user.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/users/me/email",
    request_body = UpdateEmailRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Email updated"),
        (status = 400, description = "Malformed body or missing email"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn update_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateEmailRequest>, JsonRejection>,
) -> Result<(), ApiError> {
    let Json(request) = payload?;
    state
        .service
        .change_email(&user.user_id, &request.email)
        .await?;
    Ok(())
}

#[utoipa::path(
    delete,
    path = "/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn delete_current_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    state.service.delete_account(&user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
