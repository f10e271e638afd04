// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed-token codec.
//!
//! Tokens are HMAC-signed JWTs carrying `sub`, `purpose`, `iat`, `nbf`, `exp`,
//! `iss` and `aud`. Verification fails closed: every failure collapses into
//! [`TokenError::InvalidToken`].

use std::fmt;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use usher_config::SigningAlgorithm;

// =============================================================================
// TokenPurpose
// =============================================================================

/// The claim that separates one credential kind from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenPurpose {
    /// Short-lived primary credential.
    AccessToken,
    /// Long-lived credential used only to rotate the pair.
    RefreshToken,
    /// Step-up credential gating sensitive operations.
    PasswordConfirmation,
}

impl TokenPurpose {
    /// All purposes, in issuance order.
    pub const ALL: [TokenPurpose; 3] = [
        TokenPurpose::AccessToken,
        TokenPurpose::RefreshToken,
        TokenPurpose::PasswordConfirmation,
    ];

    /// Returns the wire name of this purpose.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::AccessToken => "access-token",
            TokenPurpose::RefreshToken => "refresh-token",
            TokenPurpose::PasswordConfirmation => "password-confirmation",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Claims and options
// =============================================================================

/// Claims carried by every signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject id.
    pub sub: String,
    /// Credential kind.
    pub purpose: TokenPurpose,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Not valid before (seconds since epoch).
    pub nbf: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
}

/// Options for [`sign`].
#[derive(Debug, Clone, Copy)]
pub struct SignOptions<'a> {
    /// Purpose claim to embed.
    pub purpose: TokenPurpose,
    /// Lifetime in seconds, counted from issuance.
    pub duration_secs: i64,
    /// HMAC secret.
    pub secret: &'a [u8],
    /// Issuer claim.
    pub issuer: &'a str,
    /// Audience claim.
    pub audience: &'a str,
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,
}

/// Options for [`verify`].
#[derive(Debug, Clone, Copy)]
pub struct VerifyOptions<'a> {
    /// Purpose the token must carry.
    pub purpose: TokenPurpose,
    /// HMAC secret.
    pub secret: &'a [u8],
    /// Expected issuer.
    pub issuer: &'a str,
    /// Expected audience.
    pub audience: &'a str,
    /// Accepted algorithm.
    pub algorithm: SigningAlgorithm,
}

/// Codec failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token failed verification for any reason.
    #[error("invalid token")]
    InvalidToken,

    /// The claims could not be encoded.
    #[error("failed to sign token: {message}")]
    Signing {
        /// Error message.
        message: String,
    },
}

fn algorithm(alg: SigningAlgorithm) -> Algorithm {
    match alg {
        SigningAlgorithm::HS256 => Algorithm::HS256,
        SigningAlgorithm::HS384 => Algorithm::HS384,
        SigningAlgorithm::HS512 => Algorithm::HS512,
    }
}

// =============================================================================
// sign / verify
// =============================================================================

/// Signs a token for `subject`, valid immediately and until `iat + duration_secs`.
pub fn sign(subject: &str, options: &SignOptions<'_>) -> Result<String, TokenError> {
    let iat = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: subject.to_string(),
        purpose: options.purpose,
        iat,
        nbf: iat,
        exp: iat + options.duration_secs,
        iss: options.issuer.to_string(),
        aud: options.audience.to_string(),
    };

    encode(
        &Header::new(algorithm(options.algorithm)),
        &claims,
        &EncodingKey::from_secret(options.secret),
    )
    .map_err(|e| TokenError::Signing {
        message: e.to_string(),
    })
}

/// Verifies `token` and returns its claims.
pub fn verify(token: &str, options: &VerifyOptions<'_>) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(algorithm(options.algorithm));
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_issuer(&[options.issuer]);
    validation.set_audience(&[options.audience]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(options.secret), &validation)
        .map_err(|e| {
            tracing::trace!(error = %e, "Token verification failed");
            TokenError::InvalidToken
        })?;

    let claims = data.claims;
    if claims.purpose != options.purpose || claims.sub.is_empty() {
        return Err(TokenError::InvalidToken);
    }
    Ok(claims)
}

// =============================================================================
// Tests
// =============================================================================
