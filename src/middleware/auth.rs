// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token authentication middleware.

use crate::error::AuthError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie that may carry the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "algosim_token";

/// Authenticated user extracted from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// Middleware that requires a valid access token.
///
/// The token is taken from the `Authorization: Bearer` header, falling back
/// to the session cookie. The user must still exist; a deleted account
/// answers 401 like any other rejected credential.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => h
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or(AuthError::InvalidCredentials)?,
        None => jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AuthError::InvalidCredentials)?,
    };

    let user = state
        .auth
        .validate_access_token(&token)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                tracing::debug!("Access token for a deleted user");
                AuthError::InvalidCredentials
            } else {
                e
            }
        })?;

    request.extensions_mut().insert(AuthUser { user });
    Ok(next.run(request).await)
}
