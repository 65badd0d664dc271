// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service-account credentials and OAuth2 access tokens.
//!
//! The admin user-management endpoints require a Google OAuth2 bearer token.
//! [`AccessTokenSource`] signs a JWT assertion with the service-account key,
//! exchanges it at the key's `token_uri` and reuses the token until shortly
//! before it expires.

use std::{
    path::Path,
    time::{Duration, Instant},
};

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before the provider says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const ADMIN_SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform \
https://www.googleapis.com/auth/firebase \
https://www.googleapis.com/auth/identitytoolkit \
https://www.googleapis.com/auth/userinfo.email";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("credentials file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported credentials type \"{0}\" (expected service_account)")]
    UnsupportedType(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("failed to sign token assertion: {0}")]
    Signing(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),
}

/// The fields of a Google service-account key file this gateway uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CredentialsError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CredentialsError> {
        let key: ServiceAccountKey = serde_json::from_str(raw)?;
        if key.key_type != "service_account" {
            return Err(CredentialsError::UnsupportedType(key.key_type));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Mints and caches OAuth2 access tokens for a service account.
pub struct AccessTokenSource {
    client_email: String,
    key_id: String,
    token_uri: String,
    signing_key: EncodingKey,
    http: Client,
    cache: RwLock<Option<CachedToken>>,
}

impl AccessTokenSource {
    pub fn new(key: &ServiceAccountKey, http: Client) -> Result<Self, CredentialsError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;

        Ok(Self {
            client_email: key.client_email.clone(),
            key_id: key.private_key_id.clone(),
            token_uri: key.token_uri.clone(),
            signing_key,
            http,
            cache: RwLock::new(None),
        })
    }

    /// Return a valid access token, exchanging a fresh assertion when needed.
    pub async fn token(&self) -> Result<String, CredentialsError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if Instant::now() < entry.refresh_at {
                    return Ok(entry.value.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(entry) = &*cache {
            if Instant::now() < entry.refresh_at {
                return Ok(entry.value.clone());
            }
        }

        let (value, lifetime) = self.exchange().await?;
        *cache = Some(CachedToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });
        Ok(value)
    }

    fn assertion(&self, now: i64) -> Result<String, CredentialsError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key_id.clone());

        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: ADMIN_SCOPES,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&header, &claims, &self.signing_key)
            .map_err(|e| CredentialsError::Signing(e.to_string()))
    }

    async fn exchange(&self) -> Result<(String, Duration), CredentialsError> {
        let assertion = self.assertion(Utc::now().timestamp())?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CredentialsError::Exchange(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialsError::Exchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialsError::Exchange(format!("invalid token response: {e}")))?;

        if token.access_token.trim().is_empty() {
            return Err(CredentialsError::Exchange(
                "token response did not include access_token".to_string(),
            ));
        }

        let lifetime = Duration::from_secs(
            token
                .expires_in
                .unwrap_or(ASSERTION_LIFETIME_SECS as u64),
        );
        debug!(
            client_email = %self.client_email,
            expires_in_secs = lifetime.as_secs(),
            "obtained service account access token"
        );

        Ok((token.access_token, lifetime))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) const TEST_PRIVATE_KEY: &str = include_str!("testdata/signing_key.pem");
    pub(crate) const TEST_MODULUS: &str = include_str!("testdata/signing_key.n");

    pub(crate) fn service_account_json(token_uri: &str) -> String {
        json!({
            "type": "service_account",
            "project_id": "demo-project",
            "private_key_id": "key-1",
            "private_key": TEST_PRIVATE_KEY,
            "client_email": "gateway@demo-project.iam.gserviceaccount.com",
            "token_uri": token_uri,
        })
        .to_string()
    }

    #[test]
    fn parses_service_account_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("credentials.json");
        std::fs::write(&file, service_account_json("https://oauth2.example.com/token")).unwrap();

        let key = ServiceAccountKey::from_file(&file).unwrap();
        assert_eq!(key.project_id, "demo-project");
        assert_eq!(key.private_key_id, "key-1");
        assert_eq!(key.token_uri, "https://oauth2.example.com/token");
    }

    #[test]
    fn token_uri_defaults_to_google() {
        let raw = json!({
            "type": "service_account",
            "project_id": "p",
            "private_key_id": "k",
            "private_key": TEST_PRIVATE_KEY,
            "client_email": "e@p.iam.gserviceaccount.com",
        })
        .to_string();
        let key = ServiceAccountKey::from_json(&raw).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn rejects_non_service_account_credentials() {
        let raw = json!({
            "type": "authorized_user",
            "project_id": "p",
            "private_key_id": "k",
            "private_key": "",
            "client_email": "e",
        })
        .to_string();
        assert!(matches!(
            ServiceAccountKey::from_json(&raw),
            Err(CredentialsError::UnsupportedType(t)) if t == "authorized_user"
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/creds.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/creds.json"));
    }

    #[test]
    fn assertion_is_signed_for_token_endpoint() {
        let key = ServiceAccountKey::from_json(&service_account_json(
            "https://oauth2.example.com/token",
        ))
        .unwrap();
        let source = AccessTokenSource::new(&key, Client::new()).unwrap();
        let now = Utc::now().timestamp();
        let assertion = source.assertion(now).unwrap();

        let decoding_key = DecodingKey::from_rsa_components(TEST_MODULUS.trim(), "AQAB").unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.example.com/token"]);
        let data = decode::<serde_json::Value>(&assertion, &decoding_key, &validation).unwrap();

        assert_eq!(data.header.kid.as_deref(), Some("key-1"));
        assert_eq!(
            data.claims["iss"],
            "gateway@demo-project.iam.gserviceaccount.com"
        );
        assert_eq!(data.claims["exp"], now + ASSERTION_LIFETIME_SECS);
        assert!(data.claims["scope"]
            .as_str()
            .unwrap()
            .contains("identitytoolkit"));
    }

    #[tokio::test]
    async fn exchanges_assertion_once_and_caches_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.test",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let key = ServiceAccountKey::from_json(&service_account_json(&format!(
            "{}/token",
            server.uri()
        )))
        .unwrap();
        let source = AccessTokenSource::new(&key, Client::new()).unwrap();

        assert_eq!(source.token().await.unwrap(), "ya29.test");
        assert_eq!(source.token().await.unwrap(), "ya29.test");
    }

    #[tokio::test]
    async fn exchange_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let key = ServiceAccountKey::from_json(&service_account_json(&format!(
            "{}/token",
            server.uri()
        )))
        .unwrap();
        let source = AccessTokenSource::new(&key, Client::new()).unwrap();

        let err = source.token().await.unwrap_err();
        assert!(matches!(err, CredentialsError::Exchange(_)));
        assert!(err.to_string().contains("invalid_grant"));
    }
}
