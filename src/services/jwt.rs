// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session credential issuance and verification.
//!
//! Access tokens are self-contained HS256 JWTs and are never stored.
//! Refresh tokens are opaque random strings backed by a stored record,
//! so they can be revoked.

use crate::config::Config;
use crate::error::{AuthError, Result, TokenKind};
use crate::models::{RefreshToken, User};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Refresh tokens last 24 hours unless configured otherwise.
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const REFRESH_TOKEN_BYTES: usize = 32;
const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (local user id)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// The subject parsed as a user id.
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// A freshly minted credential pair. The caller persists `refresh`.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh: RefreshToken,
}

/// Stateless issuer/validator for session credentials.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    rng: SystemRandom,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
            rng: SystemRandom::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Mint an access token and a companion refresh-token record for `user`.
    pub fn issue(&self, user: &User) -> Result<IssuedTokens> {
        let now = Utc::now();
        let access_token = self.sign_access_token(user, now)?;

        let refresh_expires_at = chrono::Duration::from_std(self.refresh_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("Refresh TTL out of range")))?;
        let refresh = RefreshToken::new(user.id, self.random_secret()?, refresh_expires_at);

        Ok(IssuedTokens {
            access_token,
            refresh,
        })
    }

    fn sign_access_token(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let exp = i64::try_from(self.access_ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("Access TTL out of range")))?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat,
            nbf: iat,
            exp,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    fn random_secret(&self) -> Result<String> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Verify signature, algorithm, and time window; return the claims.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        // Reject foreign algorithms before touching the signature.
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        if header.alg != ALGORITHM {
            tracing::debug!(alg = ?header.alg, "Rejected token with unexpected algorithm");
            return Err(AuthError::InvalidSignature);
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => AuthError::Expired(TokenKind::AccessToken),
                ErrorKind::ImmatureSignature => AuthError::NotYetValid,
                _ => AuthError::InvalidToken,
            }
        })?;

        // Reject subjects that cannot name a user.
        data.claims.user_id()?;
        Ok(data.claims)
    }

    /// Check a stored refresh record against the current time.
    pub fn validate_refresh(&self, record: &RefreshToken) -> Result<()> {
        if record.is_expired_at(Utc::now()) {
            return Err(AuthError::Expired(TokenKind::RefreshToken));
        }
        Ok(())
    }
}
