// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed OAuth `state` values for CSRF protection on the login round-trip.
//!
//! Format before encoding: `nonce_hex|timestamp_hex|signature_hex`, where the
//! signature is HMAC-SHA256 over `nonce_hex|timestamp_hex`. The whole string
//! is URL-safe base64 without padding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use subtle::ConstantTimeEq;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a login attempt may take between redirect and callback.
pub const STATE_MAX_AGE_SECS: i64 = 10 * 60;

const NONCE_BYTES: usize = 16;

/// Create a fresh signed state value.
pub fn sign_state(key: &[u8]) -> anyhow::Result<String> {
    sign_state_at(key, Utc::now())
}

fn sign_state_at(key: &[u8], now: DateTime<Utc>) -> anyhow::Result<String> {
    let mut nonce = [0u8; NONCE_BYTES];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| anyhow::anyhow!("System RNG failure"))?;

    let payload = format!("{}|{:x}", hex::encode(nonce), now.timestamp_millis());
    let signature = mac(key, &payload)?;

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify signature and age of a state value produced by [`sign_state`].
pub fn verify_state(state: &str, key: &[u8]) -> bool {
    verify_state_at(state, key, Utc::now())
}

fn verify_state_at(state: &str, key: &[u8], now: DateTime<Utc>) -> bool {
    let Some((payload, timestamp_ms, signature_hex)) = split_state(state) else {
        return false;
    };

    let Ok(expected) = mac(key, &payload) else {
        return false;
    };
    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    let Some(issued_at) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) else {
        return false;
    };
    let age = now - issued_at;
    if age > Duration::seconds(STATE_MAX_AGE_SECS) || age < Duration::seconds(-60) {
        tracing::warn!(age_secs = age.num_seconds(), "Stale OAuth state rejected");
        return false;
    }

    true
}

/// Decode into (signed payload, timestamp millis, signature hex).
fn split_state(state: &str) -> Option<(String, i64, String)> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let timestamp_ms = i64::from_str_radix(parts[1], 16).ok()?;
    Some((
        format!("{}|{}", parts[0], parts[1]),
        timestamp_ms,
        parts[2].to_string(),
    ))
}

fn mac(key: &[u8], payload: &str) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
