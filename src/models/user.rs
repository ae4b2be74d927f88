// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local user identity, linked to exactly one provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local identifier (immutable)
    pub id: Uuid,
    /// Email address reported by the provider
    pub email: String,
    /// OAuth provider name, e.g. "google"
    pub provider: String,
    /// Provider's stable subject identifier
    pub provider_id: String,
    /// When the user first signed in
    pub created_at: DateTime<Utc>,
    /// Last profile update
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build an unsaved user with a fresh identifier.
    pub fn new(
        email: impl Into<String>,
        provider: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            provider: provider.into(),
            provider_id: provider_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True if this user is the local identity for the given provider account.
    pub fn matches_provider(&self, provider: &str, provider_id: &str) -> bool {
        self.provider == provider && self.provider_id == provider_id
    }
}
