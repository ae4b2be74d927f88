// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication orchestration: OAuth login, token rotation, logout,
//! and access-token validation.
//!
//! A login attempt moves through
//! `Initiated → CodeExchanged → ProfileFetched → IdentityResolved →
//! CredentialIssued → Persisted`; any failure aborts the attempt and the
//! error carries the name of the failing step.

use crate::db::{TokenStore, UserStore};
use crate::error::{AuthError, Result, StageExt};
use crate::models::{RefreshToken, TokenPair, User};
use crate::services::jwt::{IssuedTokens, TokenIssuer};
use crate::services::oauth::OAuthProvider;
use chrono::Utc;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-key mutexes used to serialize work on one identity or credential.
type KeyedLocks<K> = DashMap<K, Arc<Mutex<()>>>;

/// Coordinates the OAuth adapter, the token issuer and both stores.
///
/// Holds no user or token data itself; all records live in the stores
/// and are referenced by id.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    provider: Arc<dyn OAuthProvider>,
    issuer: TokenIssuer,
    /// Serializes find-or-create per (provider, subject).
    identity_locks: KeyedLocks<(String, String)>,
    /// Serializes rotation/revocation per refresh record id.
    refresh_locks: KeyedLocks<Uuid>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        provider: Arc<dyn OAuthProvider>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            users,
            tokens,
            provider,
            issuer,
            identity_locks: DashMap::new(),
            refresh_locks: DashMap::new(),
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    // ─── Login ───────────────────────────────────────────────────────────────

    /// Authorization URL for the configured provider.
    pub fn initiate_login(&self, state: &str) -> String {
        self.provider.authorization_url(state)
    }

    /// Authorization URL, after checking the requested provider is ours.
    pub fn initiate_login_for(&self, provider: &str, state: &str) -> Result<String> {
        if provider != self.provider.name() {
            return Err(AuthError::ProviderUnsupported(provider.to_string()));
        }
        Ok(self.initiate_login(state))
    }

    /// Complete an OAuth login: exchange the code, resolve the local user,
    /// and issue a fresh credential pair.
    pub async fn handle_callback(&self, code: &str) -> Result<TokenPair> {
        let provider_token = self
            .provider
            .exchange_code(code)
            .await
            .stage("exchange code")?;

        let profile = self
            .provider
            .fetch_profile(&provider_token.access_token)
            .await
            .stage("fetch profile")?;

        let user = self
            .resolve_user(self.provider.to_local_user(&profile))
            .await
            .stage("resolve user")?;

        let pair = self.issue_and_store(&user).await?;

        tracing::info!(user_id = %user.id, provider = %user.provider, "OAuth login complete");
        Ok(pair)
    }

    /// Find the user for the candidate's provider identity, creating it from
    /// `candidate` if unseen. Existing users are returned unchanged.
    async fn resolve_user(&self, candidate: User) -> Result<User> {
        let key = (candidate.provider.clone(), candidate.provider_id.clone());
        let lock = acquire(&self.identity_locks, key.clone());

        let result = {
            let _guard = lock.lock().await;
            self.find_or_create(candidate).await
        };

        drop(lock);
        release(&self.identity_locks, &key);
        result
    }

    async fn find_or_create(&self, candidate: User) -> Result<User> {
        match self
            .users
            .find_by_provider_id(&candidate.provider, &candidate.provider_id)
            .await
        {
            Ok(existing) => Ok(existing),
            Err(AuthError::NotFound(_)) => {
                self.users.create(&candidate).await?;
                tracing::info!(
                    user_id = %candidate.id,
                    provider = %candidate.provider,
                    "Created user for new provider identity"
                );
                Ok(candidate)
            }
            Err(e) => Err(e),
        }
    }

    async fn issue_and_store(&self, user: &User) -> Result<TokenPair> {
        let IssuedTokens {
            access_token,
            refresh,
        } = self.issuer.issue(user).stage("issue tokens")?;

        self.tokens
            .create(&refresh)
            .await
            .stage("store refresh token")?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.issuer.access_ttl().as_secs(),
        })
    }

    // ─── Refresh / logout ────────────────────────────────────────────────────

    /// Rotate a refresh token: the presented secret is consumed and a new
    /// access/refresh pair is returned.
    ///
    /// The new record is stored before the old one is deleted, so an
    /// interrupted rotation leaves two valid records rather than none.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let record = self
            .tokens
            .find_by_refresh_token(refresh_token)
            .await
            .stage("find refresh token")?;

        let lock = acquire(&self.refresh_locks, record.id);
        let result = {
            let _guard = lock.lock().await;
            self.rotate(record.id).await
        };

        drop(lock);
        release(&self.refresh_locks, &record.id);
        result
    }

    async fn rotate(&self, record_id: Uuid) -> Result<TokenPair> {
        // Re-read under the lock: a concurrent rotation may have consumed it.
        let record = self
            .tokens
            .find_by_id(record_id)
            .await
            .stage("find refresh token")?;

        self.issuer
            .validate_refresh(&record)
            .stage("validate refresh token")?;

        let user = self
            .users
            .find_by_id(record.user_id)
            .await
            .map_err(|e| {
                if matches!(e, AuthError::NotFound(_)) {
                    tracing::error!(
                        token_id = %record.id,
                        user_id = %record.user_id,
                        "Refresh token references a missing user"
                    );
                }
                e
            })
            .stage("resolve token owner")?;

        let pair = self.issue_and_store(&user).await?;

        self.tokens
            .delete(record.id)
            .await
            .stage("delete rotated refresh token")?;

        tracing::info!(user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Revoke a single refresh token. Access tokens already issued stay
    /// valid until they expire.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let record = self
            .tokens
            .find_by_refresh_token(refresh_token)
            .await
            .stage("find refresh token")?;

        let lock = acquire(&self.refresh_locks, record.id);
        let result = {
            let _guard = lock.lock().await;
            self.tokens
                .delete(record.id)
                .await
                .stage("delete refresh token")
        };

        drop(lock);
        release(&self.refresh_locks, &record.id);

        if result.is_ok() {
            tracing::info!(user_id = %record.user_id, "Refresh token revoked");
        }
        result
    }

    // ─── Validation ──────────────────────────────────────────────────────────

    /// Verify an access token and confirm its user still exists.
    pub async fn validate_access_token(&self, token: &str) -> Result<User> {
        let claims = self
            .issuer
            .validate(token)
            .stage("validate access token")?;
        let user_id = claims.user_id().stage("validate access token")?;

        self.users.find_by_id(user_id).await.stage("load user")
    }

    // ─── Sessions ────────────────────────────────────────────────────────────

    /// Live (unexpired) sessions of a user, newest first.
    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<RefreshToken>> {
        let now = Utc::now();
        let mut sessions: Vec<RefreshToken> = self
            .tokens
            .find_by_user_id(user_id)
            .await
            .stage("list sessions")?
            .into_iter()
            .filter(|t| !t.is_expired_at(now))
            .collect();

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Revoke every refresh token of a user ("log out everywhere").
    pub async fn logout_all(&self, user_id: Uuid) -> Result<usize> {
        let revoked = self
            .tokens
            .delete_by_user_id(user_id)
            .await
            .stage("revoke sessions")?;

        tracing::info!(user_id = %user_id, revoked, "All sessions revoked");
        Ok(revoked)
    }
}

/// Get (or create) the mutex for `key`.
fn acquire<K: Eq + Hash + Clone>(locks: &KeyedLocks<K>, key: K) -> Arc<Mutex<()>> {
    locks
        .entry(key)
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Drop the mutex for `key` once nobody else holds or waits on it.
fn release<K: Eq + Hash>(locks: &KeyedLocks<K>, key: &K) {
    locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
}
