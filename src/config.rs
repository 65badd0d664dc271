// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. A `.env` file
//! in the working directory is loaded first when present.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `FIREBASE_API_KEY` | Web API key for the password-grant endpoints | Required |
//! | `GOOGLE_APPLICATION_CREDENTIALS` | Service-account credentials JSON file | Required |
//! | `FIREBASE_PROJECT_ID` | Overrides the `project_id` of the credentials | Optional |
//! | `IDENTITY_TOOLKIT_URL` | Identity Toolkit REST base URL | `https://identitytoolkit.googleapis.com` |
//! | `SECURE_TOKEN_JWKS_URL` | ID token signing keys (JWKS) | Google securetoken JWK endpoint |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{net::SocketAddr, path::PathBuf};

use thiserror::Error;
use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const API_KEY_ENV: &str = "FIREBASE_API_KEY";
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const IDENTITY_TOOLKIT_URL_ENV: &str = "IDENTITY_TOOLKIT_URL";
pub const JWKS_URL_ENV: &str = "SECURE_TOKEN_JWKS_URL";
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// PEM certificate chain and key used to serve HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Provider endpoints and secrets.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub credentials_path: PathBuf,
    pub project_id: Option<String>,
    pub identity_toolkit_url: Url,
    pub jwks_url: Url,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub provider: ProviderSettings,
    pub tls: Option<TlsFiles>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            // Logging is not initialised yet.
            eprintln!("unable to load .env file: {e}");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e| ConfigError::Invalid {
                    name: HOST_ENV,
                    reason: format!("{host}:{port}: {e}"),
                })?;

        let provider = ProviderSettings {
            api_key: get(API_KEY_ENV).ok_or(ConfigError::Missing(API_KEY_ENV))?,
            credentials_path: get(CREDENTIALS_ENV)
                .map(PathBuf::from)
                .ok_or(ConfigError::Missing(CREDENTIALS_ENV))?,
            project_id: get(PROJECT_ID_ENV),
            identity_toolkit_url: parse_url(
                IDENTITY_TOOLKIT_URL_ENV,
                get(IDENTITY_TOOLKIT_URL_ENV).as_deref(),
                DEFAULT_IDENTITY_TOOLKIT_URL,
            )?,
            jwks_url: parse_url(JWKS_URL_ENV, get(JWKS_URL_ENV).as_deref(), DEFAULT_JWKS_URL)?,
        };

        let tls = match (get(TLS_CERT_ENV), get(TLS_KEY_ENV)) {
            (Some(cert), Some(key)) => Some(TlsFiles {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_ENV)),
        };

        let log_format = get(LOG_FORMAT_ENV)
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or(LogFormat::Pretty);

        Ok(Self {
            bind_addr,
            provider,
            tls,
            log_format,
        })
    }
}

/// Accepts `8080` as well as the `:8080` form some deployments export.
fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim_start_matches(':')
        .parse()
        .map_err(|e| ConfigError::Invalid {
            name: PORT_ENV,
            reason: format!("{raw}: {e}"),
        })
}

fn parse_url(name: &'static str, value: Option<&str>, default: &str) -> Result<Url, ConfigError> {
    let raw = value.unwrap_or(default);
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{raw}: {e}"),
    })
}
