// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error taxonomy for the authentication engine, with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Stored entity kinds, used to say *what* was missing or duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    RefreshToken,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => f.write_str("user"),
            Entity::RefreshToken => f.write_str("refresh token"),
        }
    }
}

/// Credential kinds that carry an expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    AccessToken,
    RefreshToken,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::AccessToken => f.write_str("access token"),
            TokenKind::RefreshToken => f.write_str("refresh token"),
        }
    }
}

/// Authentication error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("{0} already exists")]
    AlreadyExists(Entity),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("{0} expired")]
    Expired(TokenKind),

    #[error("Token not yet valid")]
    NotYetValid,

    #[error("OAuth code exchange failed")]
    ExchangeFailed,

    #[error("OAuth profile fetch failed")]
    ProfileFetchFailed,

    #[error("OAuth provider not supported: {0}")]
    ProviderUnsupported(String),

    /// An error annotated with the step of the auth flow that produced it.
    #[error("failed to {stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<AuthError>,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Innermost error, with all stage annotations peeled off.
    pub fn root(&self) -> &AuthError {
        let mut err = self;
        while let AuthError::Stage { source, .. } = err {
            err = source;
        }
        err
    }

    /// Outermost stage annotation, if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            AuthError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), AuthError::NotFound(_))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.root(), AuthError::Expired(_))
    }
}

/// Attach the failing stage to an error on its way up to the caller.
pub trait StageExt<T> {
    fn stage(self, stage: &'static str) -> Result<T>;
}

impl<T> StageExt<T> for Result<T> {
    fn stage(self, stage: &'static str) -> Result<T> {
        self.map_err(|source| AuthError::Stage {
            stage,
            source: Box::new(source),
        })
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let stage = self.stage();
        let (status, error, details) = match self.root() {
            AuthError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                "not_found",
                Some(format!("{} not found", entity)),
            ),
            AuthError::AlreadyExists(entity) => (
                StatusCode::CONFLICT,
                "already_exists",
                Some(format!("{} already exists", entity)),
            ),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", None)
            }
            AuthError::InvalidToken | AuthError::InvalidSignature | AuthError::NotYetValid => {
                (StatusCode::UNAUTHORIZED, "invalid_token", None)
            }
            AuthError::Expired(kind) => (
                StatusCode::UNAUTHORIZED,
                "expired",
                Some(format!("{} expired", kind)),
            ),
            AuthError::ProviderUnsupported(provider) => (
                StatusCode::BAD_REQUEST,
                "provider_unsupported",
                Some(provider.clone()),
            ),
            AuthError::ExchangeFailed | AuthError::ProfileFetchFailed => {
                tracing::warn!(stage = stage.unwrap_or("oauth"), error = %self, "OAuth provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error",
                    Some(self.root().to_string()),
                )
            }
            AuthError::Internal(_) | AuthError::Stage { .. } => {
                tracing::error!(stage = stage.unwrap_or("unknown"), error = %self, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for the engine and its handlers
pub type Result<T> = std::result::Result<T, AuthError>;
