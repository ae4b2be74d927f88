// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth login, token refresh and logout routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AuthError, Result};
use crate::middleware::auth::ACCESS_TOKEN_COOKIE;
use crate::models::TokenPair;
use crate::services::oauth_state::{sign_state, verify_state};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/auth/oauth/login", get(oauth_login))
        .route("/api/v1/auth/oauth/callback", get(oauth_callback))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/logout", post(logout))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct LoginParams {
    provider: String,
}

/// Start OAuth flow - redirect to the provider's consent page.
async fn oauth_login(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoginParams>,
) -> Result<Redirect> {
    let oauth_state = sign_state(&state.config.oauth_state_key)?;
    let auth_url = state
        .auth
        .initiate_login_for(&params.provider, &oauth_state)?;

    tracing::info!(provider = %params.provider, "Starting OAuth flow");
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, resolve the user, issue a session.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Json<TokenPair>)> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from provider");
        return Err(AuthError::InvalidCredentials);
    }

    let state_ok = params
        .state
        .as_deref()
        .is_some_and(|s| verify_state(s, &state.config.oauth_state_key));
    if !state_ok {
        tracing::warn!("Invalid or missing OAuth state parameter");
        return Err(AuthError::InvalidCredentials);
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::InvalidCredentials)?;

    let pair = state.auth.handle_callback(&code).await?;
    let jar = jar.add(access_cookie(&state, pair.access_token.clone()));

    Ok((jar, Json(pair)))
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    refresh_token: String,
}

/// Exchange a refresh token for a new pair; the old one stops working.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<TokenPair>)> {
    let pair = state.auth.refresh(&body.refresh_token).await?;
    let jar = jar.add(access_cookie(&state, pair.access_token.clone()));

    Ok((jar, Json(pair)))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Revoke one refresh token and clear the access cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    state.auth.logout(&body.refresh_token).await?;

    Ok((
        jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/")),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Browser copy of the access token. Session-scoped; the JWT carries its
/// own expiry.
pub(crate) fn access_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::GoogleOAuth;

    fn state(frontend_url: &str) -> AppState {
        let mut config = Config::test_default();
        config.frontend_url = frontend_url.to_string();
        let google = GoogleOAuth::new(config.google.clone()).unwrap();
        AppState::new(config, Arc::new(google))
    }

    #[test]
    fn test_access_cookie_localhost() {
        let cookie = access_cookie(&state("http://localhost:5173"), "t".to_string());
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("algosim_token=t"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_access_cookie_secure_for_https_frontend() {
        let cookie = access_cookie(&state("https://algosim.example.com"), "t".to_string());
        assert!(cookie.to_string().contains("Secure"));
    }
}
