// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod google;
pub mod jwt;
pub mod oauth;
pub mod oauth_state;
pub mod users;

pub use auth::AuthService;
pub use google::GoogleOAuth;
pub use jwt::{Claims, TokenIssuer};
pub use oauth::{OAuthProvider, ProviderProfile, ProviderToken};
pub use users::UserService;
