// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential transport over signed cookies.
//!
//! Every credential kind travels in its own signed, http-only, `SameSite=Lax`
//! cookie whose max-age equals the credential's configured lifetime. Only the
//! outbound cookie jar is touched; request state is never modified.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use usher_config::{AuthConfig, CredentialConfig};

use super::codec::TokenPurpose;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
struct CookieSpec {
    name: String,
    max_age_secs: i64,
    secure: bool,
}

impl From<&CredentialConfig> for CookieSpec {
    fn from(config: &CredentialConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            max_age_secs: config.duration_secs,
            secure: config.secure,
        }
    }
}

/// Reads and writes credential cookies.
#[derive(Clone)]
pub struct CredentialCookies {
    key: Key,
    specs: Arc<[CookieSpec; 3]>,
}

impl CredentialCookies {
    /// Builds the binder from auth configuration.
    ///
    /// Fails if the cookie secret is shorter than 64 bytes.
    pub fn new(config: &AuthConfig) -> ApiResult<Self> {
        let key = Key::try_from(config.cookie_secret.expose().as_bytes())
            .map_err(|e| ApiError::configuration(format!("Invalid cookie key: {}", e)))?;

        Ok(Self {
            key,
            specs: Arc::new([
                CookieSpec::from(&config.access),
                CookieSpec::from(&config.refresh),
                CookieSpec::from(&config.confirmation),
            ]),
        })
    }

    /// Returns the cookie signing key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the cookie name used for a credential kind.
    pub fn cookie_name(&self, kind: TokenPurpose) -> &str {
        &self.spec(kind).name
    }

    fn spec(&self, kind: TokenPurpose) -> &CookieSpec {
        match kind {
            TokenPurpose::AccessToken => &self.specs[0],
            TokenPurpose::RefreshToken => &self.specs[1],
            TokenPurpose::PasswordConfirmation => &self.specs[2],
        }
    }

    /// Adds the credential cookie for `kind` to the outbound jar.
    pub fn set(&self, jar: SignedCookieJar, kind: TokenPurpose, value: impl Into<String>) -> SignedCookieJar {
        let spec = self.spec(kind);
        let cookie = Cookie::build((spec.name.clone(), value.into()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(spec.secure)
            .max_age(time::Duration::seconds(spec.max_age_secs));
        jar.add(cookie)
    }

    /// Adds a removal cookie for `kind` to the outbound jar.
    pub fn clear(&self, jar: SignedCookieJar, kind: TokenPurpose) -> SignedCookieJar {
        let spec = self.spec(kind);
        jar.remove(Cookie::build((spec.name.clone(), "")).path("/"))
    }

    /// Clears every credential cookie.
    pub fn clear_all(&self, jar: SignedCookieJar) -> SignedCookieJar {
        TokenPurpose::ALL
            .into_iter()
            .fold(jar, |jar, kind| self.clear(jar, kind))
    }

    /// Reads the verified value of the credential cookie for `kind`.
    pub fn read(&self, jar: &SignedCookieJar, kind: TokenPurpose) -> Option<String> {
        jar.get(&self.spec(kind).name)
            .map(|cookie| cookie.value().to_string())
    }
}

impl std::fmt::Debug for CredentialCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCookies")
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
