// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User management on top of the user and token stores.

use crate::db::{TokenStore, UserStore};
use crate::error::{AuthError, Entity, Result, StageExt};
use crate::models::User;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { users, tokens }
    }

    /// Register a user directly. Rejects an email that is already in use.
    pub async fn create_user(
        &self,
        email: &str,
        provider: &str,
        provider_id: &str,
    ) -> Result<User> {
        match self.users.find_by_email(email).await {
            Ok(_) => return Err(AuthError::AlreadyExists(Entity::User)),
            Err(AuthError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let user = User::new(email, provider, provider_id);
        self.users.create(&user).await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.users.find_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.users.find_by_email(email).await
    }

    pub async fn get_user_by_provider(&self, provider: &str, provider_id: &str) -> Result<User> {
        self.users.find_by_provider_id(provider, provider_id).await
    }

    /// Replace a stored user, stamping `updated_at`. The id and creation
    /// time of the stored record are kept.
    pub async fn update_user(&self, user: &User) -> Result<User> {
        let existing = self.users.find_by_id(user.id).await?;

        let updated = User {
            created_at: existing.created_at,
            updated_at: Utc::now(),
            ..user.clone()
        };
        self.users.update(&updated).await?;
        Ok(updated)
    }

    /// Remove an account and every refresh token it owns.
    ///
    /// Tokens go first so a failure part-way never leaves live sessions
    /// for a deleted user.
    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.users.find_by_id(id).await.stage("find user")?;

        let revoked = self
            .tokens
            .delete_by_user_id(id)
            .await
            .stage("revoke sessions")?;
        self.users.delete(id).await.stage("delete user")?;

        tracing::info!(user_id = %id, revoked, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryTokenStore, MemoryUserStore};
    use crate::models::RefreshToken;

    fn service() -> (UserService, Arc<MemoryUserStore>, Arc<MemoryTokenStore>) {
        let users = Arc::new(MemoryUserStore::new());
        let tokens = Arc::new(MemoryTokenStore::new());
        (UserService::new(users.clone(), tokens.clone()), users, tokens)
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let (svc, _, _) = service();
        svc.create_user("a@example.com", "google", "g-1").await.unwrap();

        let err = svc
            .create_user("a@example.com", "google", "g-2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(Entity::User)));
    }

    #[tokio::test]
    async fn test_lookups() {
        let (svc, _, _) = service();
        let user = svc.create_user("a@example.com", "google", "g-1").await.unwrap();

        assert_eq!(svc.get_user(user.id).await.unwrap(), user);
        assert_eq!(svc.get_user_by_email("a@example.com").await.unwrap(), user);
        assert_eq!(svc.get_user_by_provider("google", "g-1").await.unwrap(), user);
        assert!(svc.get_user(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_user_stamps_updated_at() {
        let (svc, _, _) = service();
        let user = svc.create_user("a@example.com", "google", "g-1").await.unwrap();

        let mut changed = user.clone();
        changed.email = "b@example.com".to_string();
        changed.created_at = Utc::now() + chrono::Duration::days(1);
        let updated = svc.update_user(&changed).await.unwrap();

        assert_eq!(updated.email, "b@example.com");
        assert_eq!(updated.created_at, user.created_at);
        assert!(updated.updated_at >= user.updated_at);
        assert_eq!(svc.get_user(user.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (svc, _, _) = service();
        let err = svc
            .update_user(&User::new("a@example.com", "google", "g-1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_user_revokes_tokens() {
        let (svc, users, tokens) = service();
        let user = svc.create_user("a@example.com", "google", "g-1").await.unwrap();
        let expires = Utc::now() + chrono::Duration::hours(1);
        tokens
            .create(&RefreshToken::new(user.id, "s1".to_string(), expires))
            .await
            .unwrap();
        tokens
            .create(&RefreshToken::new(user.id, "s2".to_string(), expires))
            .await
            .unwrap();

        svc.delete_user(user.id).await.unwrap();

        assert!(users.is_empty().await);
        assert!(tokens.is_empty().await);
        assert!(svc.delete_user(user.id).await.unwrap_err().is_not_found());
    }
}
