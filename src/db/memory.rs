// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process stores.
//!
//! Each store guards one map with a single reader/writer lock: lookups take
//! the shared lock, mutations take the exclusive lock. Secondary lookups
//! (email, provider identity, refresh secret, owner) are linear scans.

use crate::db::{TokenStore, UserStore};
use crate::error::{AuthError, Entity, Result};
use crate::models::{RefreshToken, User};
use async_trait::async_trait;
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use uuid::Uuid;

// ─── Users ───────────────────────────────────────────────────

/// User store backed by a `HashMap` keyed by user id.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(AuthError::AlreadyExists(Entity::User));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AuthError::NotFound(Entity::User))
    }

    async fn find_by_email(&self, email: &str) -> Result<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(AuthError::NotFound(Entity::User))
    }

    async fn find_by_provider_id(&self, provider: &str, provider_id: &str) -> Result<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.matches_provider(provider, provider_id))
            .cloned()
            .ok_or(AuthError::NotFound(Entity::User))
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AuthError::NotFound(Entity::User)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(AuthError::NotFound(Entity::User))
    }
}

// ─── Refresh tokens ──────────────────────────────────────────

/// Refresh-token store backed by a `HashMap` keyed by record id.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<Uuid, RefreshToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, token: &RefreshToken) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.id) {
            return Err(AuthError::AlreadyExists(Entity::RefreshToken));
        }
        tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<RefreshToken> {
        self.tokens
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AuthError::NotFound(Entity::RefreshToken))
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<RefreshToken> {
        let presented = refresh_token.as_bytes();
        self.tokens
            .read()
            .await
            .values()
            .find(|t| bool::from(t.token.as_bytes().ct_eq(presented)))
            .cloned()
            .ok_or(AuthError::NotFound(Entity::RefreshToken))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshToken>> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.tokens
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(AuthError::NotFound(Entity::RefreshToken))
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.user_id != user_id);
        Ok(before - tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn sample_user(email: &str, subject: &str) -> User {
        User::new(email, "google", subject)
    }

    fn sample_token(user_id: Uuid, secret: &str) -> RefreshToken {
        RefreshToken::new(user_id, secret.to_string(), Utc::now() + Duration::hours(24))
    }

    #[tokio::test]
    async fn test_user_create_rejects_duplicate_id() {
        let store = MemoryUserStore::new();
        let user = sample_user("a@example.com", "g-1");

        store.create(&user).await.unwrap();
        let err = store.create(&user).await.unwrap_err();

        assert!(matches!(err, AuthError::AlreadyExists(Entity::User)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_user_create_does_not_enforce_email_uniqueness() {
        // Uniqueness beyond the id is the caller's responsibility.
        let store = MemoryUserStore::new();
        store.create(&sample_user("a@example.com", "g-1")).await.unwrap();
        store.create(&sample_user("a@example.com", "g-2")).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_user_secondary_lookups() {
        let store = MemoryUserStore::new();
        let user = sample_user("a@example.com", "g-1");
        store.create(&user).await.unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap(), user);
        assert_eq!(store.find_by_email("a@example.com").await.unwrap(), user);
        assert_eq!(store.find_by_provider_id("google", "g-1").await.unwrap(), user);

        assert!(store.find_by_email("b@example.com").await.unwrap_err().is_not_found());
        assert!(store
            .find_by_provider_id("github", "g-1")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_user_update_replaces_and_requires_existing() {
        let store = MemoryUserStore::new();
        let mut user = sample_user("a@example.com", "g-1");

        let err = store.update(&user).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound(Entity::User)));

        store.create(&user).await.unwrap();
        user.email = "new@example.com".to_string();
        store.update(&user).await.unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap().email, "new@example.com");
    }

    #[tokio::test]
    async fn test_user_delete() {
        let store = MemoryUserStore::new();
        let user = sample_user("a@example.com", "g-1");
        store.create(&user).await.unwrap();

        store.delete(user.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.delete(user.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_token_create_rejects_duplicate_id() {
        let store = MemoryTokenStore::new();
        let token = sample_token(Uuid::new_v4(), "secret-1");

        store.create(&token).await.unwrap();
        let err = store.create(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(Entity::RefreshToken)));
    }

    #[tokio::test]
    async fn test_token_find_by_refresh_token() {
        let store = MemoryTokenStore::new();
        let token = sample_token(Uuid::new_v4(), "secret-1");
        store.create(&token).await.unwrap();

        assert_eq!(store.find_by_refresh_token("secret-1").await.unwrap(), token);
        assert!(store
            .find_by_refresh_token("secret-2")
            .await
            .unwrap_err()
            .is_not_found());
        // Prefixes must not match.
        assert!(store
            .find_by_refresh_token("secret-")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_token_user_scoped_operations() {
        let store = MemoryTokenStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.create(&sample_token(alice, "a1")).await.unwrap();
        store.create(&sample_token(alice, "a2")).await.unwrap();
        store.create(&sample_token(bob, "b1")).await.unwrap();

        assert_eq!(store.find_by_user_id(alice).await.unwrap().len(), 2);
        assert!(store.find_by_user_id(Uuid::new_v4()).await.unwrap().is_empty());

        assert_eq!(store.delete_by_user_id(alice).await.unwrap(), 2);
        assert_eq!(store.delete_by_user_id(alice).await.unwrap(), 0);
        assert_eq!(store.len().await, 1);
        assert!(store.find_by_refresh_token("b1").await.is_ok());
    }

    #[tokio::test]
    async fn test_token_delete_missing_is_not_found() {
        let store = MemoryTokenStore::new();
        let err = store.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound(Entity::RefreshToken)));
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_visible() {
        let store = Arc::new(MemoryTokenStore::new());
        let user_id = Uuid::new_v4();

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(&sample_token(user_id, &format!("secret-{}", i)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.find_by_user_id(user_id).await.unwrap().len(), 50);
    }
}
