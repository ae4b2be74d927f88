// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer: user and refresh-token stores.

pub mod memory;

pub use memory::{MemoryTokenStore, MemoryUserStore};

use crate::error::Result;
use crate::models::{RefreshToken, User};
use async_trait::async_trait;
use uuid::Uuid;

/// User records, keyed by id, with lookups by email and provider identity.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `AlreadyExists` if the id is taken;
    /// email and provider identity uniqueness are not checked here.
    async fn create(&self, user: &User) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<User>;

    async fn find_by_provider_id(&self, provider: &str, provider_id: &str) -> Result<User>;

    /// Replace an existing user wholesale (last writer wins).
    async fn update(&self, user: &User) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Refresh-token records, keyed by id, with lookups by secret and owner.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, token: &RefreshToken) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<RefreshToken>;

    /// Look up a record by its opaque secret.
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<RefreshToken>;

    /// All records owned by a user, expired ones included. Never `NotFound`.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshToken>>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Remove every record owned by a user, returning how many were removed.
    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<usize>;
}
