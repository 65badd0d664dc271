// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firebase Authentication (Google Identity Toolkit) adapter.
//!
//! - Sign-up and sign-in use the public password-grant endpoints, keyed by
//!   the web API key passed as the `key` query parameter.
//! - User management uses the project-scoped admin endpoints, authorized
//!   with a service-account OAuth2 bearer token.
//! - ID tokens are verified locally against the published signing keys.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    credentials::{AccessTokenSource, ServiceAccountKey},
    validate_custom_claims, validate_uid, AuthenticationResult, CustomClaims, IdentityProvider,
    ProviderError,
};
use crate::auth::{IdTokenVerifier, JwksManager};
use crate::config::ProviderSettings;

/// Timeout applied to every outbound provider request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<UserInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfo {
    local_id: String,
    #[serde(default)]
    custom_attributes: Option<String>,
}

pub struct FirebaseAuth {
    http: Client,
    api_key: String,
    base_url: String,
    project_id: String,
    tokens: AccessTokenSource,
    verifier: IdTokenVerifier,
}

impl FirebaseAuth {
    /// Build the adapter from configuration, reading the credentials file.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let key = ServiceAccountKey::from_file(&settings.credentials_path)?;
        let http = build_http_client()?;
        Self::new(
            http,
            settings.api_key.clone(),
            settings.identity_toolkit_url.as_str(),
            &key,
            settings.project_id.clone(),
            settings.jwks_url.as_str(),
        )
    }

    pub fn new(
        http: Client,
        api_key: String,
        base_url: &str,
        key: &ServiceAccountKey,
        project_id: Option<String>,
        jwks_url: &str,
    ) -> Result<Self, ProviderError> {
        let project_id = project_id.unwrap_or_else(|| key.project_id.clone());
        let tokens = AccessTokenSource::new(key, http.clone())?;
        let verifier = IdTokenVerifier::new(JwksManager::new(jwks_url, http.clone()), &project_id);

        info!(project_id = %project_id, base_url = %base_url, "identity provider configured");

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            tokens,
            verifier,
        })
    }

    fn public_endpoint(&self, action: &str) -> String {
        format!("{}/v1/accounts:{action}", self.base_url)
    }

    fn admin_endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1/projects/{}/accounts:{action}",
            self.base_url, self.project_id
        )
    }

    async fn password_grant(
        &self,
        action: &str,
        operation: &'static str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        let response = self
            .http
            .post(self.public_endpoint(action))
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordGrantRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| transport(operation, format!("request failed: {e}")))?;

        decode_response(operation, response).await
    }

    async fn admin_call<T: DeserializeOwned>(
        &self,
        action: &str,
        operation: &'static str,
        body: &Value,
    ) -> Result<T, ProviderError> {
        let access_token = self.tokens.token().await?;
        let response = self
            .http
            .post(self.admin_endpoint(action))
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(operation, format!("request failed: {e}")))?;

        decode_response(operation, response).await
    }

    async fn lookup(
        &self,
        operation: &'static str,
        body: Value,
    ) -> Result<Option<UserInfo>, ProviderError> {
        let response: LookupResponse = self.admin_call("lookup", operation, &body).await?;
        Ok(response.users.into_iter().next())
    }

    async fn update(&self, operation: &'static str, body: Value) -> Result<(), ProviderError> {
        let _: Value = self.admin_call("update", operation, &body).await?;
        Ok(())
    }
}

/// HTTP client shared by all provider calls.
pub fn build_http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| transport("build HTTP client", e.to_string()))
}

fn transport(operation: &'static str, message: String) -> ProviderError {
    ProviderError::Transport { operation, message }
}

/// Decode a success body, or surface the provider's `error.message`.
async fn decode_response<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .map_err(|e| transport(operation, format!("unable to read error response: {e}")))?;
        let detail: ErrorResponse = serde_json::from_str(&body).map_err(|e| {
            transport(
                operation,
                format!("unable to decode error response ({status}): {e}"),
            )
        })?;
        debug!(operation, %status, message = %detail.error.message, "provider rejected request");
        return Err(ProviderError::Rejected {
            operation,
            message: detail.error.message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| transport(operation, format!("unable to decode response: {e}")))
}

fn parse_custom_attributes(raw: Option<&str>) -> Result<CustomClaims, ProviderError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(CustomClaims::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|e| {
            transport(
                "get user claims",
                format!("custom attributes are not a JSON object: {e}"),
            )
        }),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        self.password_grant("signUp", "signup new user", email, password)
            .await
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        self.password_grant("signInWithPassword", "signin the user", email, password)
            .await
    }

    async fn validate_token(&self, token: &str) -> Result<String, ProviderError> {
        let claims = self.verifier.verify(token).await?;
        Ok(claims.sub)
    }

    async fn delete_user(&self, uid: &str) -> Result<(), ProviderError> {
        validate_uid(uid)?;
        let _: Value = self
            .admin_call("delete", "delete user", &json!({ "localId": uid }))
            .await?;
        info!(uid, "deleted user");
        Ok(())
    }

    async fn exist_by_email(&self, email: &str) -> Result<String, ProviderError> {
        if email.is_empty() {
            return Err(ProviderError::InvalidArgument(
                "email must be a non-empty string".to_string(),
            ));
        }
        self.lookup("find user by email", json!({ "email": [email] }))
            .await?
            .map(|user| user.local_id)
            .ok_or_else(|| ProviderError::UserNotFound(email.to_string()))
    }

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), ProviderError> {
        validate_uid(uid)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::InvalidArgument(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.update(
            "update user",
            json!({ "localId": uid, "password": password }),
        )
        .await
    }

    async fn update_email(&self, uid: &str, email: &str) -> Result<(), ProviderError> {
        validate_uid(uid)?;
        if email.is_empty() {
            return Err(ProviderError::InvalidArgument(
                "email must be a non-empty string".to_string(),
            ));
        }
        self.update(
            "update user email",
            json!({ "localId": uid, "email": email }),
        )
        .await
    }

    async fn set_custom_claims(
        &self,
        uid: &str,
        claims: &CustomClaims,
    ) -> Result<(), ProviderError> {
        validate_uid(uid)?;
        validate_custom_claims(claims)?;
        let attributes = serde_json::to_string(claims)
            .map_err(|e| ProviderError::InvalidClaims(e.to_string()))?;
        self.update(
            "set custom claims",
            json!({ "localId": uid, "customAttributes": attributes }),
        )
        .await
    }

    async fn get_custom_claims(&self, uid: &str) -> Result<CustomClaims, ProviderError> {
        validate_uid(uid)?;
        let user = self
            .lookup("get user claims", json!({ "localId": [uid] }))
            .await?
            .ok_or_else(|| ProviderError::UserNotFound(uid.to_string()))?;
        parse_custom_attributes(user.custom_attributes.as_deref())
    }

    async fn check_ready(&self) -> Result<(), ProviderError> {
        let jwks = self.verifier.jwks();
        if jwks.is_cached().await {
            return Ok(());
        }
        jwks.refresh().await.map_err(ProviderError::SigningKeys)
    }
}
