// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth provider adapter interface and the payloads it returns.

use crate::error::Result;
use crate::models::User;
use async_trait::async_trait;
use serde::Deserialize;

/// Token endpoint response from the provider.
///
/// Only `access_token` is used; the rest is kept for completeness.
#[derive(Clone, Deserialize)]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderToken")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// User profile returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderProfile {
    /// Provider subject id
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// A single OAuth2 identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Provider name stored on users, e.g. "google".
    fn name(&self) -> &str;

    /// Authorization URL for the given anti-CSRF `state`. No I/O.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<ProviderToken>;

    /// Fetch the profile of the user who owns `access_token`.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile>;

    /// Map a provider profile to an unsaved local user. No I/O.
    fn to_local_user(&self, profile: &ProviderProfile) -> User {
        User::new(profile.email.clone(), self.name(), profile.id.clone())
    }
}
