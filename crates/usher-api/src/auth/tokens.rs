// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token lifecycle management.
//!
//! [`TokenService`] maps each [`TokenPurpose`] to its secret and lifetime and
//! delegates to the codec, so every credential kind shares one signing and
//! one verification path.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use usher_config::{AuthConfig, CredentialConfig, SigningAlgorithm};

use super::codec::{self, SignOptions, TokenError, TokenPurpose, VerifyOptions};
use crate::error::{ApiError, ApiResult};

// =============================================================================
// Issued tokens
// =============================================================================

/// A freshly signed token and its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// The signed token.
    pub token: String,
    /// Expiry in milliseconds since the epoch.
    pub expires_at: i64,
}

/// Access and refresh tokens issued together on login or rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token.
    pub access: IssuedToken,
    /// Refresh token.
    pub refresh: IssuedToken,
}

// =============================================================================
// TokenService
// =============================================================================

#[derive(Debug)]
struct Inner {
    issuer: String,
    audience: String,
    algorithm: SigningAlgorithm,
    access: CredentialConfig,
    refresh: CredentialConfig,
    confirmation: CredentialConfig,
}

/// Issues and validates tokens for every purpose.
///
/// Cheap to clone; the configuration is shared.
#[derive(Debug, Clone)]
pub struct TokenService {
    inner: Arc<Inner>,
}

impl TokenService {
    /// Creates a service from validated auth configuration.
    pub fn new(config: &AuthConfig) -> ApiResult<Self> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                issuer: config.issuer.clone(),
                audience: config.audience.clone(),
                algorithm: config.algorithm,
                access: config.access.clone(),
                refresh: config.refresh.clone(),
                confirmation: config.confirmation.clone(),
            }),
        })
    }

    /// Returns the credential configuration for a purpose.
    pub fn credential(&self, purpose: TokenPurpose) -> &CredentialConfig {
        match purpose {
            TokenPurpose::AccessToken => &self.inner.access,
            TokenPurpose::RefreshToken => &self.inner.refresh,
            TokenPurpose::PasswordConfirmation => &self.inner.confirmation,
        }
    }

    /// Signs a token of `purpose` for `subject_id`.
    pub fn issue(&self, purpose: TokenPurpose, subject_id: &str) -> ApiResult<IssuedToken> {
        let credential = self.credential(purpose);
        let options = SignOptions {
            purpose,
            duration_secs: credential.duration_secs,
            secret: credential.secret.expose().as_bytes(),
            issuer: &self.inner.issuer,
            audience: &self.inner.audience,
            algorithm: self.inner.algorithm,
        };

        let token = codec::sign(subject_id, &options)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        let expires_at = Utc::now().timestamp_millis() + credential.duration_secs * 1000;

        tracing::debug!(
            subject_id = %subject_id,
            purpose = %purpose,
            expires_at = expires_at,
            "Token issued"
        );

        Ok(IssuedToken { token, expires_at })
    }

    /// Issues a fresh access and refresh token.
    pub fn issue_pair(&self, subject_id: &str) -> ApiResult<TokenPair> {
        Ok(TokenPair {
            access: self.issue(TokenPurpose::AccessToken, subject_id)?,
            refresh: self.issue(TokenPurpose::RefreshToken, subject_id)?,
        })
    }

    /// Verifies a token of `purpose` and returns its subject id.
    ///
    /// Codec failures surface as [`ApiError::Unauthorized`].
    pub fn validate(&self, purpose: TokenPurpose, token: &str) -> ApiResult<String> {
        let credential = self.credential(purpose);
        let options = VerifyOptions {
            purpose,
            secret: credential.secret.expose().as_bytes(),
            issuer: &self.inner.issuer,
            audience: &self.inner.audience,
            algorithm: self.inner.algorithm,
        };

        match codec::verify(token, &options) {
            Ok(claims) => Ok(claims.sub),
            Err(TokenError::InvalidToken) => {
                tracing::debug!(purpose = %purpose, "Rejected invalid token");
                Err(ApiError::unauthorized(format!("Invalid {}", purpose)))
            }
            Err(e) => Err(ApiError::internal(e.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
