// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token checks for protected routes and verification of
//! provider-issued ID tokens.
//!
//! ## Auth Flow
//!
//! 1. A client signs in through `/signin` and receives an ID token
//! 2. The client sends `Authorization: Bearer <ID token>`
//! 3. The gateway:
//!    - Fetches the provider signing keys (JWKS) via HTTPS, cached
//!    - Verifies signature, expiry, issuer, audience and subject
//!    - Attaches the `sub` claim as the request's [`AuthenticatedUser`]
//!
//! ## Security
//!
//! - Rejections from the middleware are bare `401` responses
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod token;

pub use claims::{AuthenticatedUser, IdTokenClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, CurrentUser};
pub use jwks::JwksManager;
pub use middleware::require_bearer;
pub use token::IdTokenVerifier;
