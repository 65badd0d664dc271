// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! The provider rotates its ID token signing keys and advertises how long a
//! key set may be reused through `Cache-Control: max-age`. Keys are cached
//! for that long, or for [`DEFAULT_CACHE_TTL`] when the header is absent.
//!
//! A token naming an unknown `kid` may refetch the set early, but at most
//! once per [`MIN_REFETCH_INTERVAL`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::DecodingKey;
use reqwest::header::CACHE_CONTROL;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum time between two fetches of the key set.
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }

    fn recently_fetched(&self) -> bool {
        self.fetched_at.elapsed() < MIN_REFETCH_INTERVAL
    }
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS URL
    jwks_url: String,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager sharing the gateway's HTTP client.
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache: Arc::new(RwLock::new(None)),
            client,
        }
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = (*cache).as_ref().filter(|e| e.is_fresh()) {
                return Ok(entry.jwks.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have fetched while we waited for the lock.
        if let Some(entry) = (*cache).as_ref().filter(|e| e.is_fresh()) {
            return Ok(entry.jwks.clone());
        }
        self.store(&mut cache).await
    }

    /// Refetch after a `kid` miss unless the set was fetched very recently.
    async fn refetch_for_unknown_kid(&self) -> Result<JwkSet, AuthError> {
        let mut cache = self.cache.write().await;
        if let Some(entry) = (*cache).as_ref().filter(|e| e.recently_fetched()) {
            return Ok(entry.jwks.clone());
        }
        self.store(&mut cache).await
    }

    /// Fetch the key set and replace the cache entry. Callers hold the write lock.
    async fn store(&self, cache: &mut Option<CacheEntry>) -> Result<JwkSet, AuthError> {
        let (jwks, max_age) = self.fetch_jwks().await?;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
            ttl: max_age.unwrap_or(DEFAULT_CACHE_TTL),
        });
        Ok(jwks)
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<(JwkSet, Option<Duration>), AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let max_age = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age);

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        debug!(
            url = %self.jwks_url,
            keys = jwks.keys.len(),
            max_age_secs = ?max_age.map(|d| d.as_secs()),
            "fetched signing keys"
        );

        Ok((jwks, max_age))
    }

    /// Get a decoding key for the given key ID.
    ///
    /// An unknown key id triggers a refetch, since the provider may have
    /// rotated keys before our cached copy expired.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }

        let jwks = self.refetch_for_unknown_kid().await?;
        let jwk = find_key(&jwks, kid).ok_or(AuthError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let mut cache = self.cache.write().await;
        self.store(&mut cache).await.map(|_| ())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        (*cache).as_ref().is_some_and(CacheEntry::is_fresh)
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Extract `max-age` seconds from a Cache-Control header value.
fn parse_max_age(value: &str) -> Option<Duration> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Convert a JWK to a DecodingKey. ID tokens are RS256 only.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    if let Some(alg) = jwk.common.key_algorithm {
        if alg != KeyAlgorithm::RS256 {
            return Err(AuthError::InternalError(format!(
                "unsupported key algorithm {alg:?}"
            )));
        }
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}"))),
        _ => Err(AuthError::InternalError(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}
