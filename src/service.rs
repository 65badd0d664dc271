// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Application Service
//!
//! Turns transport input models into provider calls and provider results
//! into response models. Business rules live here:
//!
//! - sign-up requires an email
//! - a password reset only happens after its token validates
//!
//! Every failure carries an operation prefix (`failed to sign in: ...`) and
//! an [`ErrorKind`] that the HTTP layer maps to a status code.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{
    AuthResult, CurrentUserResponse, PasswordResetInput, SignInInput, SignUpInput, SignUpQuery,
    UserLookupResponse,
};
use crate::provider::{CustomClaims, IdentityProvider, ProviderError};

/// Custom claim that grants access to the admin routes.
pub const ADMIN_CLAIM: &str = "admin";

/// Coarse classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input failed a business rule before any provider call.
    Validation,
    /// The provider has no matching user.
    NotFound,
    /// The supplied token did not validate.
    InvalidToken,
    /// The provider refused or could not be reached.
    Provider,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("failed to sign in: {0}")]
    SignIn(#[source] ProviderError),

    #[error("failed to create user: {0}")]
    SignUp(#[source] ProviderError),

    #[error("invalid token: {0}")]
    InvalidToken(#[source] ProviderError),

    #[error("failed to update password: {0}")]
    UpdatePassword(#[source] ProviderError),

    #[error("failed to update email: {0}")]
    UpdateEmail(#[source] ProviderError),

    #[error("failed to delete user: {0}")]
    DeleteUser(#[source] ProviderError),

    #[error("failed to find user: {0}")]
    FindUser(#[source] ProviderError),

    #[error("failed to read user claims: {0}")]
    ReadClaims(#[source] ProviderError),

    #[error("failed to set user claims: {0}")]
    SetClaims(#[source] ProviderError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::InvalidToken(_) => ErrorKind::InvalidToken,
            ServiceError::FindUser(ProviderError::UserNotFound(_))
            | ServiceError::ReadClaims(ProviderError::UserNotFound(_)) => ErrorKind::NotFound,
            ServiceError::SetClaims(
                ProviderError::InvalidClaims(_) | ProviderError::InvalidArgument(_),
            ) => ErrorKind::Validation,
            _ => ErrorKind::Provider,
        }
    }
}

pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn sign_in(&self, input: SignInInput) -> Result<AuthResult, ServiceError> {
        let result = self
            .provider
            .sign_in(&input.email, &input.password)
            .await
            .map_err(|e| logged(ServiceError::SignIn(e)))?;
        Ok(result.into())
    }

    /// Create an account. `links` is accepted for compatibility and only logged.
    pub async fn sign_up(
        &self,
        input: SignUpInput,
        links: SignUpQuery,
    ) -> Result<AuthResult, ServiceError> {
        input.validate().map_err(ServiceError::Validation)?;

        if links.member_id.is_some() || links.lodger_id.is_some() {
            info!(
                member_id = ?links.member_id,
                lodger_id = ?links.lodger_id,
                "sign-up carries unused account links"
            );
        }

        let result = self
            .provider
            .sign_up(&input.email, &input.password)
            .await
            .map_err(|e| logged(ServiceError::SignUp(e)))?;
        info!(uid = %result.id, "created user");
        Ok(result.into())
    }

    /// Check the token in `input`; the resolved subject is discarded.
    pub async fn validate_token(&self, input: PasswordResetInput) -> Result<(), ServiceError> {
        self.authenticate(&input.token).await.map(|_| ())
    }

    /// Update the password of the account the token was issued to.
    pub async fn reset_password(&self, input: PasswordResetInput) -> Result<(), ServiceError> {
        let uid = self.authenticate(&input.token).await?;
        self.provider
            .update_password(&uid, &input.password)
            .await
            .map_err(|e| logged(ServiceError::UpdatePassword(e)))?;
        info!(uid = %uid, "password updated");
        Ok(())
    }

    pub async fn current_user(&self, uid: &str) -> Result<CurrentUserResponse, ServiceError> {
        let custom_claims = self.claims(uid).await?;
        Ok(CurrentUserResponse {
            local_id: uid.to_string(),
            custom_claims,
        })
    }

    pub async fn change_email(&self, uid: &str, email: &str) -> Result<(), ServiceError> {
        if email.is_empty() {
            return Err(ServiceError::Validation("email is required".to_string()));
        }
        self.provider
            .update_email(uid, email)
            .await
            .map_err(|e| logged(ServiceError::UpdateEmail(e)))
    }

    pub async fn delete_account(&self, uid: &str) -> Result<(), ServiceError> {
        self.provider
            .delete_user(uid)
            .await
            .map_err(|e| logged(ServiceError::DeleteUser(e)))
    }

    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<UserLookupResponse, ServiceError> {
        if email.is_empty() {
            return Err(ServiceError::Validation("email is required".to_string()));
        }
        let local_id = self
            .provider
            .exist_by_email(email)
            .await
            .map_err(|e| logged(ServiceError::FindUser(e)))?;
        Ok(UserLookupResponse { local_id })
    }

    pub async fn set_user_claims(
        &self,
        uid: &str,
        claims: CustomClaims,
    ) -> Result<(), ServiceError> {
        self.provider
            .set_custom_claims(uid, &claims)
            .await
            .map_err(|e| logged(ServiceError::SetClaims(e)))?;
        info!(uid, claims = claims.len(), "custom claims updated");
        Ok(())
    }

    /// Whether `uid` carries the `admin: true` custom claim.
    pub async fn is_admin(&self, uid: &str) -> Result<bool, ServiceError> {
        let claims = self.claims(uid).await?;
        Ok(claims.get(ADMIN_CLAIM) == Some(&Value::Bool(true)))
    }

    async fn authenticate(&self, token: &str) -> Result<String, ServiceError> {
        self.provider
            .validate_token(token)
            .await
            .map_err(|e| logged(ServiceError::InvalidToken(e)))
    }

    async fn claims(&self, uid: &str) -> Result<CustomClaims, ServiceError> {
        self.provider
            .get_custom_claims(uid)
            .await
            .map_err(|e| logged(ServiceError::ReadClaims(e)))
    }
}

fn logged(err: ServiceError) -> ServiceError {
    warn!(kind = ?err.kind(), error = %err, "service operation failed");
    err
}
