// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public authentication endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

use crate::{
    error::ApiError,
    models::{AuthResult, PasswordResetInput, SignInInput, SignUpInput, SignUpQuery},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/signup",
    params(SignUpQuery),
    request_body = SignUpInput,
    tag = "Auth",
    responses(
        (status = 200, description = "Account created", body = AuthResult),
        (status = 400, description = "Malformed body or missing email"),
        (status = 500, description = "Provider rejected the request")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    query: Result<Query<SignUpQuery>, QueryRejection>,
    payload: Result<Json<SignUpInput>, JsonRejection>,
) -> Result<Json<AuthResult>, ApiError> {
    let Query(links) = query?;
    let Json(input) = payload?;
    Ok(Json(state.service.sign_up(input, links).await?))
}

#[utoipa::path(
    post,
    path = "/signin",
    request_body = SignInInput,
    tag = "Auth",
    responses(
        (status = 200, description = "Signed in", body = AuthResult),
        (status = 400, description = "Malformed body"),
        (status = 500, description = "Provider rejected the credentials")
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SignInInput>, JsonRejection>,
) -> Result<Json<AuthResult>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.service.sign_in(input).await?))
}

#[utoipa::path(
    post,
    path = "/password/reset",
    request_body = PasswordResetInput,
    tag = "Auth",
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Malformed body"),
        (status = 500, description = "Invalid token or provider failure")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<PasswordResetInput>, JsonRejection>,
) -> Result<(), ApiError> {
    let Json(input) = payload?;
    state.service.reset_password(input).await?;
    Ok(())
}

/// Check an ID token. Only the `token` field of the body is read.
#[utoipa::path(
    post,
    path = "/token/validate",
    request_body = PasswordResetInput,
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid"),
        (status = 400, description = "Malformed body"),
        (status = 500, description = "Token is invalid")
    )
)]
pub async fn validate_token(
    State(state): State<AppState>,
    payload: Result<Json<PasswordResetInput>, JsonRejection>,
) -> Result<(), ApiError> {
    let Json(input) = payload?;
    state.service.validate_token(input).await?;
    Ok(())
}
