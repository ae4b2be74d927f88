// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 client.
//!
//! Handles:
//! - Authorization URL construction
//! - Authorization code exchange
//! - Userinfo profile fetch

use crate::config::GoogleOAuthConfig;
use crate::error::{AuthError, Result};
use crate::services::oauth::{OAuthProvider, ProviderProfile, ProviderToken};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "google";

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider endpoints. Overridable so tests can target a local server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }
}

/// Google OAuth2 adapter.
#[derive(Clone)]
pub struct GoogleOAuth {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
    endpoints: GoogleEndpoints,
}

impl GoogleOAuth {
    pub fn new(config: GoogleOAuthConfig) -> anyhow::Result<Self> {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(
        config: GoogleOAuthConfig,
        endpoints: GoogleEndpoints,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Self {
            http,
            config,
            endpoints,
        })
    }

    /// Check status and parse the JSON body, mapping any failure to `failure`.
    ///
    /// The provider's error body is not propagated; only the status is logged.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
        failure: AuthError,
        what: &'static str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, step = what, "Google OAuth request rejected");
            return Err(failure);
        }

        match response.json().await {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::warn!(error = %e, step = what, "Malformed Google OAuth response");
                Err(failure)
            }
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn authorization_url(&self, state: &str) -> String {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.endpoints.auth_url, query)
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderToken> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Google token exchange request failed");
                AuthError::ExchangeFailed
            })?;

        let token: ProviderToken =
            Self::parse_response(response, AuthError::ExchangeFailed, "exchange").await?;
        if token.access_token.is_empty() {
            return Err(AuthError::ExchangeFailed);
        }
        Ok(token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile> {
        let response = self
            .http
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Google userinfo request failed");
                AuthError::ProfileFetchFailed
            })?;

        let profile: ProviderProfile =
            Self::parse_response(response, AuthError::ProfileFetchFailed, "userinfo").await?;
        if profile.id.is_empty() {
            return Err(AuthError::ProfileFetchFailed);
        }
        Ok(profile)
    }
}
