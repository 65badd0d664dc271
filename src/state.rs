// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{provider::IdentityProvider, service::AuthService};

/// Shared state handed to every handler. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AuthService>,
    pub provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            service: Arc::new(AuthService::new(provider.clone())),
            provider,
        }
    }
}
