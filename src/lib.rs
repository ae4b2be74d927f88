// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Algosim authentication service.
//!
//! Users sign in through an external OAuth2 provider (Google). The service
//! maps the provider identity to a local user and issues its own session
//! credentials: a short-lived HS256 access token and an opaque, rotating
//! refresh token.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::{MemoryTokenStore, MemoryUserStore, TokenStore, UserStore};
use services::{AuthService, OAuthProvider, TokenIssuer, UserService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub users: UserService,
}

impl AppState {
    /// Wire the services around fresh in-memory stores.
    pub fn new(config: Config, provider: Arc<dyn OAuthProvider>) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        Self::with_stores(config, provider, users, tokens)
    }

    pub fn with_stores(
        config: Config,
        provider: Arc<dyn OAuthProvider>,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let issuer = TokenIssuer::from_config(&config);
        Self {
            auth: AuthService::new(users.clone(), tokens.clone(), provider, issuer),
            users: UserService::new(users, tokens),
            config,
        }
    }
}
