// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use algosim_auth::config::Config;
use algosim_auth::db::{MemoryTokenStore, MemoryUserStore};
use algosim_auth::error::{AuthError, Result};
use algosim_auth::routes::create_router;
use algosim_auth::services::{OAuthProvider, ProviderProfile, ProviderToken};
use algosim_auth::AppState;
use async_trait::async_trait;
use std::sync::Arc;

/// Offline provider. Known codes map to fixed identities:
/// - "abc"   → subject "g-1", a@example.com
/// - "other" → subject "g-2", b@example.com
/// - "no-profile" exchanges but the profile call fails
///
/// Any other code is rejected at exchange.
pub struct StubProvider;

#[async_trait]
impl OAuthProvider for StubProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.test/o/oauth2/v2/auth?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderToken> {
        match code {
            "abc" | "other" | "no-profile" => Ok(ProviderToken {
                access_token: format!("provider-token-{}", code),
                refresh_token: None,
                expires_in: Some(3600),
                token_type: Some("Bearer".to_string()),
                scope: None,
            }),
            _ => Err(AuthError::ExchangeFailed),
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile> {
        let (id, email) = match access_token {
            "provider-token-abc" => ("g-1", "a@example.com"),
            "provider-token-other" => ("g-2", "b@example.com"),
            _ => return Err(AuthError::ProfileFetchFailed),
        };
        Ok(ProviderProfile {
            id: id.to_string(),
            email: email.to_string(),
            verified_email: true,
            name: None,
            given_name: None,
            family_name: None,
            picture: None,
            locale: None,
        })
    }
}

/// Test fixture with direct handles on the stores.
#[allow(dead_code)]
pub struct TestApp {
    pub state: Arc<AppState>,
    pub users: Arc<MemoryUserStore>,
    pub tokens: Arc<MemoryTokenStore>,
}

#[allow(dead_code)]
pub fn test_state_with_config(config: Config) -> TestApp {
    let users = Arc::new(MemoryUserStore::new());
    let tokens = Arc::new(MemoryTokenStore::new());
    let state = Arc::new(AppState::with_stores(
        config,
        Arc::new(StubProvider),
        users.clone(),
        tokens.clone(),
    ));
    TestApp {
        state,
        users,
        tokens,
    }
}

#[allow(dead_code)]
pub fn test_state() -> TestApp {
    test_state_with_config(Config::test_default())
}

/// Create a test app with offline stub dependencies.
/// Returns the router and the fixture.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, TestApp) {
    let app = test_state();
    (create_router(app.state.clone()), app)
}
