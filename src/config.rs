// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup and passed explicitly to the services
//! that need them.

use std::env;
use std::time::Duration;

const DEFAULT_SCOPES: &str = "openid email profile";

/// Upper bound for any configured token lifetime (one year).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Interface to bind
    pub host: String,
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,

    // --- Session tokens ---
    /// HS256 signing secret for access tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,

    // --- Google OAuth ---
    pub google: GoogleOAuthConfig,
}

/// OAuth client settings for Google.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            access_token_ttl: Duration::from_secs(3600),
            refresh_token_ttl: Duration::from_secs(24 * 60 * 60),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
            google: GoogleOAuthConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                redirect_uri: "http://localhost:8080/api/v1/auth/oauth/callback".to_string(),
                scopes: parse_scopes(DEFAULT_SCOPES),
            },
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("SERVER_PORT").or_else(|_| env::var("PORT")) {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("SERVER_PORT"))?,
            Err(_) => 8080,
        };

        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            jwt_secret: required("AUTH_JWT_SECRET")?.into_bytes(),
            access_token_ttl: seconds_or("AUTH_TOKEN_TTL", 3600)?,
            refresh_token_ttl: seconds_or("AUTH_REFRESH_TOKEN_TTL", 24 * 60 * 60)?,
            oauth_state_key: required("OAUTH_STATE_KEY")?.into_bytes(),

            google: GoogleOAuthConfig {
                client_id: required("GOOGLE_OAUTH_CLIENT_ID")?,
                client_secret: required("GOOGLE_OAUTH_CLIENT_SECRET")?,
                redirect_uri: required("GOOGLE_OAUTH_REDIRECT_URI")?,
                scopes: parse_scopes(
                    &env::var("GOOGLE_OAUTH_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string()),
                ),
            },
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.to_string())
}

fn seconds_or(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(v) => {
            let secs: u64 = v.trim().parse().map_err(|_| ConfigError::Invalid(name))?;
            if secs == 0 || secs > MAX_TTL_SECS {
                return Err(ConfigError::Invalid(name));
            }
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Split a scope list on whitespace or commas.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("AUTH_JWT_SECRET", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("OAUTH_STATE_KEY", "state_key");
        env::set_var("GOOGLE_OAUTH_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_OAUTH_CLIENT_SECRET", "test_secret");
        env::set_var("GOOGLE_OAUTH_REDIRECT_URI", "http://localhost/cb");
        env::set_var("GOOGLE_OAUTH_SCOPES", "openid,email profile");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google.client_id, "test_id");
        assert_eq!(config.google.client_secret, "test_secret");
        assert_eq!(config.google.scopes, vec!["openid", "email", "profile"]);
        assert_eq!(config.jwt_secret, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(86400));
    }

    #[test]
    fn test_seconds_or_bounds() {
        env::set_var("ALGOSIM_TEST_TTL_OK", "7200");
        env::set_var("ALGOSIM_TEST_TTL_ZERO", "0");
        env::set_var("ALGOSIM_TEST_TTL_HUGE", (MAX_TTL_SECS + 1).to_string());

        assert_eq!(
            seconds_or("ALGOSIM_TEST_TTL_OK", 60).unwrap(),
            Duration::from_secs(7200)
        );
        assert_eq!(
            seconds_or("ALGOSIM_TEST_TTL_UNSET", 60).unwrap(),
            Duration::from_secs(60)
        );
        assert!(matches!(
            seconds_or("ALGOSIM_TEST_TTL_ZERO", 60),
            Err(ConfigError::Invalid("ALGOSIM_TEST_TTL_ZERO"))
        ));
        assert!(matches!(
            seconds_or("ALGOSIM_TEST_TTL_HUGE", 60),
            Err(ConfigError::Invalid("ALGOSIM_TEST_TTL_HUGE"))
        ));
    }

    #[test]
    fn test_parse_scopes_ignores_empty_entries() {
        assert_eq!(parse_scopes(" openid ,, email "), vec!["openid", "email"]);
        assert!(parse_scopes("").is_empty());
    }
}
