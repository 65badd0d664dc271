// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_bearer,
    models::{
        AuthResult, CurrentUserResponse, PasswordResetInput, SignInInput, SignUpInput,
        UpdateEmailRequest, UserLookupResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/password/reset", post(auth::reset_password))
        .route("/token/validate", post(auth::validate_token))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(users::get_current_user).delete(users::delete_current_user),
        )
        .route("/users/me/email", put(users::update_email))
        .route("/admin/users", get(admin::find_user))
        .route("/admin/users/{uid}/claims", put(admin::set_claims))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup,
        auth::signin,
        auth::reset_password,
        auth::validate_token,
        users::get_current_user,
        users::update_email,
        users::delete_current_user,
        admin::find_user,
        admin::set_claims,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SignInInput,
            SignUpInput,
            PasswordResetInput,
            AuthResult,
            CurrentUserResponse,
            UpdateEmailRequest,
            UserLookupResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Sign-up, sign-in and token checks"),
        (name = "Users", description = "Self-service account management"),
        (name = "Admin", description = "User management for admins"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
