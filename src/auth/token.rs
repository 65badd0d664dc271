// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token verification against the provider's published signing keys.
//!
//! A token is accepted when:
//! - the header is RS256 with a `kid` present in the provider JWKS
//! - the signature verifies with that key
//! - `aud` is the project id and `iss` is `https://securetoken.google.com/<project id>`
//! - `exp` is in the future and `iat`/`auth_time` are not
//! - `sub` is a non-empty string of at most 128 characters

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};

use super::{claims::IdTokenClaims, jwks::JwksManager, AuthError};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

const MAX_SUBJECT_LEN: usize = 128;

/// Verifies ID tokens issued for one provider project.
#[derive(Clone)]
pub struct IdTokenVerifier {
    jwks: JwksManager,
    project_id: String,
    issuer: String,
}

impl IdTokenVerifier {
    pub fn new(jwks: JwksManager, project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            jwks,
            issuer: format!("{ISSUER_PREFIX}{project_id}"),
            project_id,
        }
    }

    pub fn jwks(&self) -> &JwksManager {
        &self.jwks
    }

    /// Verify `token` and return its claims.
    pub async fn verify(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::MalformedToken);
        }
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let decoding_key = self.jwks.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.project_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<IdTokenClaims>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?
            .claims;

        let latest_issue = Utc::now().timestamp() + CLOCK_SKEW_LEEWAY as i64;
        if claims.iat > latest_issue || claims.auth_time.is_some_and(|t| t > latest_issue) {
            return Err(AuthError::TokenNotYetValid);
        }

        if claims.sub.is_empty() || claims.sub.chars().count() > MAX_SUBJECT_LEN {
            return Err(AuthError::InvalidSubject);
        }

        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::provider::credentials::tests::{TEST_MODULUS, TEST_PRIVATE_KEY};

    pub(crate) const PROJECT: &str = "demo-project";

    pub(crate) fn signing_keys() -> Value {
        json!({
            "keys": [{
                "kty": "RSA",
                "alg": "RS256",
                "use": "sig",
                "kid": "key-1",
                "n": TEST_MODULUS.trim(),
                "e": "AQAB"
            }]
        })
    }

    pub(crate) fn claims_for(sub: &str) -> Value {
        let now = Utc::now().timestamp();
        json!({
            "sub": sub,
            "iss": format!("{ISSUER_PREFIX}{PROJECT}"),
            "aud": PROJECT,
            "iat": now - 10,
            "exp": now + 3600,
            "auth_time": now - 10,
        })
    }

    pub(crate) fn sign(claims: &Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap();
        encode(&header, claims, &key).unwrap()
    }

    pub(crate) async fn jwks_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(signing_keys()))
            .mount(&server)
            .await;
        server
    }

    fn verifier(server: &MockServer) -> IdTokenVerifier {
        IdTokenVerifier::new(
            JwksManager::new(format!("{}/jwks", server.uri()), reqwest::Client::new()),
            PROJECT,
        )
    }

    #[tokio::test]
    async fn accepts_well_formed_token() {
        let server = jwks_server().await;
        let token = sign(&claims_for("u1"), "key-1");

        let claims = verifier(&server).verify(&token).await.unwrap();
        assert_eq!(claims.sub, "u1");
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let server = jwks_server().await;
        let mut claims = claims_for("u1");
        claims["aud"] = json!("another-project");

        let err = verifier(&server)
            .verify(&sign(&claims, "key-1"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidAudience);
    }

    #[tokio::test]
    async fn rejects_wrong_issuer() {
        let server = jwks_server().await;
        let mut claims = claims_for("u1");
        claims["iss"] = json!("https://accounts.google.com");

        let err = verifier(&server)
            .verify(&sign(&claims, "key-1"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidIssuer);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let server = jwks_server().await;
        let mut claims = claims_for("u1");
        let now = Utc::now().timestamp();
        claims["iat"] = json!(now - 7200);
        claims["auth_time"] = json!(now - 7200);
        claims["exp"] = json!(now - 3600);

        let err = verifier(&server)
            .verify(&sign(&claims, "key-1"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn rejects_token_issued_in_the_future() {
        let server = jwks_server().await;
        let mut claims = claims_for("u1");
        claims["iat"] = json!(Utc::now().timestamp() + 600);

        let err = verifier(&server)
            .verify(&sign(&claims, "key-1"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::TokenNotYetValid);
    }

    #[tokio::test]
    async fn rejects_empty_subject() {
        let server = jwks_server().await;
        let err = verifier(&server)
            .verify(&sign(&claims_for(""), "key-1"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidSubject);
    }

    #[tokio::test]
    async fn rejects_unknown_key_id() {
        let server = jwks_server().await;
        let err = verifier(&server)
            .verify(&sign(&claims_for("u1"), "key-2"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::NoMatchingKey);
    }

    #[tokio::test]
    async fn rejects_tampered_payload() {
        let server = jwks_server().await;
        let token = sign(&claims_for("u1"), "key-1");
        let forged_payload = sign(&claims_for("admin"), "key-1");

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload.split('.').nth(1).unwrap();
        let forged = parts.join(".");

        let err = verifier(&server).verify(&forged).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let server = jwks_server().await;
        let err = verifier(&server).verify("bad").await.unwrap_err();
        assert_eq!(err, AuthError::MalformedToken);
    }
}
