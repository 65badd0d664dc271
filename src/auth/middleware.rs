// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer-token authorization middleware.
//!
//! Apply to a router subtree with
//! `axum::middleware::from_fn_with_state(state, require_bearer)`. On success
//! the resolved [`AuthenticatedUser`] is inserted into the request extensions
//! for the `CurrentUser` extractor. Every rejection is a bare `401`.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication middleware function.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => {
            debug!(reason = e.error_code(), "rejecting request without bearer token");
            return e.into_response();
        }
    };

    match state.provider.validate_token(&token).await {
        Ok(user_id) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::new(user_id));
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "rejecting request with invalid bearer token");
            AuthError::InvalidToken.into_response()
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    use crate::provider::fake::FakeProvider;

    fn app(provider: Arc<FakeProvider>) -> Router {
        let state = AppState::new(provider);
        Router::new()
            .route(
                "/protected",
                get(|Extension(user): Extension<AuthenticatedUser>| async move { user.user_id }),
            )
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_bearer,
            ))
            .with_state(state)
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingAuthHeader));

        headers.insert(AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert_eq!(bearer_token(&headers), Err(AuthError::InvalidAuthHeader));

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), Err(AuthError::InvalidAuthHeader));

        headers.insert(AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Err(AuthError::InvalidAuthHeader));

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok("abc"));
    }

    #[tokio::test]
    async fn malformed_headers_never_reach_validation() {
        let provider = Arc::new(FakeProvider::new().with_token("good", "u1"));

        for header in [None, Some("Basic xyz"), Some("Bearer"), Some("Token good")] {
            let (status, body) = call(app(provider.clone()), header).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{header:?}");
            assert!(body.is_empty());
        }
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let provider = Arc::new(FakeProvider::new().with_token("good", "u1"));

        let (status, body) = call(app(provider.clone()), Some("Bearer forged")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
        assert_eq!(provider.calls(), vec!["validate_token:forged"]);
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let provider = Arc::new(FakeProvider::new().with_token("good", "u1"));

        let (status, body) = call(app(provider.clone()), Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "u1");
    }
}
