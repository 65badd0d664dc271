// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity Gateway - HTTP front end for Firebase Authentication
//!
//! Exposes sign-up, sign-in, password reset and token validation over JSON,
//! plus bearer-protected account endpoints. All identity state lives in the
//! provider; the gateway keeps none.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer middleware, extractors and ID token verification
//! - `config` - Environment configuration
//! - `provider` - Identity provider capability and Firebase adapter
//! - `service` - Business rules between the API and the provider

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod service;
pub mod state;
