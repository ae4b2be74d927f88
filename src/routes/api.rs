// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::{AuthUser, ACCESS_TOKEN_COOKIE};
use crate::models::{RefreshToken, User};
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// API routes (require a valid access token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/auth/me", get(get_me))
        .route("/api/v1/auth/sessions", get(get_sessions))
        .route("/api/v1/auth/logout-all", post(logout_all))
        .route("/api/v1/account", delete(delete_account))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            provider: user.provider,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Get current user profile.
async fn get_me(Extension(auth): Extension<AuthUser>) -> Json<UserResponse> {
    Json(auth.user.into())
}

// ─── Sessions ────────────────────────────────────────────────

/// One live refresh token, without its secret.
#[derive(Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<RefreshToken> for SessionResponse {
    fn from(token: RefreshToken) -> Self {
        Self {
            id: token.id,
            created_at: token.created_at,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionResponse>,
}

async fn get_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<SessionsResponse>> {
    let sessions = state.auth.list_sessions(auth.user.id).await?;

    Ok(Json(SessionsResponse {
        sessions: sessions.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Serialize)]
pub struct LogoutAllResponse {
    pub revoked: usize,
}

/// Revoke every refresh token of the current user.
async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutAllResponse>)> {
    let revoked = state.auth.logout_all(auth.user.id).await?;

    Ok((
        jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/")),
        Json(LogoutAllResponse { revoked }),
    ))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

/// Delete the current user and all of their sessions.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    tracing::info!(user_id = %auth.user.id, "User-initiated account deletion");

    state.users.delete_user(auth.user.id).await?;

    Ok((
        jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/")),
        Json(DeleteAccountResponse {
            success: true,
            message: "Account deleted".to_string(),
        }),
    ))
}
