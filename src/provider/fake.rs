// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory [`IdentityProvider`] for tests.
//!
//! Every call is recorded as `"<operation>:<arg>:<arg>"` so tests can assert
//! which provider operations ran and in what order.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    validate_custom_claims, AuthenticationResult, CustomClaims, IdentityProvider, ProviderError,
};
use crate::auth::AuthError;

#[derive(Default)]
pub(crate) struct FakeProvider {
    tokens: HashMap<String, String>,
    users: HashMap<String, String>,
    deleted: HashSet<String>,
    result: Option<AuthenticationResult>,
    failure: Option<String>,
    ready: bool,
    claims: Mutex<HashMap<String, CustomClaims>>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self {
            ready: true,
            ..Default::default()
        }
    }

    /// Accept `token` as an ID token issued to `uid`.
    pub(crate) fn with_token(mut self, token: &str, uid: &str) -> Self {
        self.tokens.insert(token.to_string(), uid.to_string());
        self
    }

    /// Register an account so lookups by email resolve to `uid`.
    pub(crate) fn with_user(mut self, email: &str, uid: &str) -> Self {
        self.users.insert(email.to_string(), uid.to_string());
        self
    }

    /// Make claim lookups for `uid` fail as if the account was deleted.
    pub(crate) fn with_deleted_user(mut self, uid: &str) -> Self {
        self.deleted.insert(uid.to_string());
        self
    }

    pub(crate) fn with_claims(self, uid: &str, claims: Value) -> Self {
        if let Value::Object(map) = claims {
            self.claims
                .lock()
                .unwrap()
                .insert(uid.to_string(), map);
        }
        self
    }

    /// Result returned by sign-up and sign-in.
    pub(crate) fn with_result(mut self, result: AuthenticationResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Make every operation except token validation fail with `message`.
    pub(crate) fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub(crate) fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn claims_of(&self, uid: &str) -> Option<CustomClaims> {
        self.claims.lock().unwrap().get(uid).cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failure(&self, operation: &'static str) -> Result<(), ProviderError> {
        match &self.failure {
            Some(message) => Err(ProviderError::Rejected {
                operation,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn session(&self, email: &str) -> AuthenticationResult {
        self.result.clone().unwrap_or_else(|| AuthenticationResult {
            id: format!("uid-{email}"),
            token: format!("token-{email}"),
            email: email.to_string(),
            refresh_token: format!("refresh-{email}"),
            expires_in: "3600".to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        self.record(format!("sign_up:{email}:{password}"));
        self.check_failure("signup new user")?;
        Ok(self.session(email))
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, ProviderError> {
        self.record(format!("sign_in:{email}:{password}"));
        self.check_failure("signin the user")?;
        Ok(self.session(email))
    }

    async fn validate_token(&self, token: &str) -> Result<String, ProviderError> {
        self.record(format!("validate_token:{token}"));
        self.tokens
            .get(token)
            .cloned()
            .ok_or(ProviderError::InvalidToken(AuthError::InvalidSignature))
    }

    async fn delete_user(&self, uid: &str) -> Result<(), ProviderError> {
        self.record(format!("delete_user:{uid}"));
        self.check_failure("delete user")
    }

    async fn exist_by_email(&self, email: &str) -> Result<String, ProviderError> {
        self.record(format!("exist_by_email:{email}"));
        self.check_failure("find user by email")?;
        self.users
            .get(email)
            .cloned()
            .ok_or_else(|| ProviderError::UserNotFound(email.to_string()))
    }

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), ProviderError> {
        self.record(format!("update_password:{uid}:{password}"));
        self.check_failure("update user")
    }

    async fn update_email(&self, uid: &str, email: &str) -> Result<(), ProviderError> {
        self.record(format!("update_email:{uid}:{email}"));
        self.check_failure("update user email")
    }

    async fn set_custom_claims(
        &self,
        uid: &str,
        claims: &CustomClaims,
    ) -> Result<(), ProviderError> {
        self.record(format!("set_custom_claims:{uid}"));
        self.check_failure("set custom claims")?;
        validate_custom_claims(claims)?;
        self.claims
            .lock()
            .unwrap()
            .insert(uid.to_string(), claims.clone());
        Ok(())
    }

    async fn get_custom_claims(&self, uid: &str) -> Result<CustomClaims, ProviderError> {
        self.record(format!("get_custom_claims:{uid}"));
        self.check_failure("get user claims")?;
        if self.deleted.contains(uid) {
            return Err(ProviderError::UserNotFound(uid.to_string()));
        }
        Ok(self.claims_of(uid).unwrap_or_default())
    }

    async fn check_ready(&self) -> Result<(), ProviderError> {
        if self.ready {
            Ok(())
        } else {
            Err(ProviderError::SigningKeys(AuthError::JwksFetchError(
                "connection refused".to_string(),
            )))
        }
    }
}
