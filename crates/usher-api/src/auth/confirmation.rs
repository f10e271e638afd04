// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Step-up confirmation.
//!
//! A request moves from authenticated to confirmed only when a subject is
//! present and a confirmation payload for that subject validates. The guard
//! owns the error taxonomy; the cryptography lives in the injected
//! [`ConfirmationValidator`].

use std::sync::Arc;

use async_trait::async_trait;

use super::codec::TokenPurpose;
use super::context::Principal;
use super::tokens::TokenService;
use crate::error::{ApiError, ApiResult};

/// Decides whether a confirmation payload is valid for a subject.
#[async_trait]
pub trait ConfirmationValidator<S>: Send + Sync {
    /// Returns `true` if `payload` confirms `subject`.
    async fn validate(&self, subject: &S, payload: &str) -> ApiResult<bool>;
}

/// Orchestrates the step-up check for sensitive operations.
pub struct ConfirmationGuard<S> {
    validator: Arc<dyn ConfirmationValidator<S>>,
}

impl<S> Clone for ConfirmationGuard<S> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
        }
    }
}

impl<S: Send + Sync> ConfirmationGuard<S> {
    /// Creates a guard around a validator.
    pub fn new(validator: Arc<dyn ConfirmationValidator<S>>) -> Self {
        Self { validator }
    }

    /// Runs the check.
    ///
    /// Absent subject is `Unauthorized`, absent payload is `BadRequest`,
    /// anything else is the validator's verdict.
    pub async fn check(&self, subject: Option<&S>, payload: Option<&str>) -> ApiResult<bool> {
        let subject = subject.ok_or_else(|| ApiError::unauthorized("No authenticated subject"))?;
        let payload = payload
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::bad_request("Password confirmation required"))?;

        self.validator.validate(subject, payload).await
    }
}

/// Validates `password-confirmation` tokens issued to the same subject.
pub struct TokenConfirmationValidator {
    tokens: TokenService,
}

impl TokenConfirmationValidator {
    /// Creates a validator backed by the token service.
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl<S: Principal> ConfirmationValidator<S> for TokenConfirmationValidator {
    async fn validate(&self, subject: &S, payload: &str) -> ApiResult<bool> {
        let confirmed_id = self
            .tokens
            .validate(TokenPurpose::PasswordConfirmation, payload)?;
        let matches = confirmed_id == subject.principal_id();
        if !matches {
            tracing::debug!(
                subject_id = %subject.principal_id(),
                "Confirmation token belongs to another subject"
            );
        }
        Ok(matches)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_auth_config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Subject(&'static str);

    impl Principal for Subject {
        fn principal_id(&self) -> &str {
            self.0
        }
    }

    struct FixedValidator {
        verdict: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConfirmationValidator<Subject> for FixedValidator {
        async fn validate(&self, _subject: &Subject, _payload: &str) -> ApiResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict)
        }
    }

    fn fixed(verdict: bool) -> Arc<FixedValidator> {
        Arc::new(FixedValidator {
            verdict,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_missing_subject_is_unauthorized() {
        let validator = fixed(true);
        let guard: ConfirmationGuard<Subject> = ConfirmationGuard::new(validator.clone());

        let err = guard.check(None, Some("payload")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_payload_is_bad_request() {
        let validator = fixed(true);
        let guard: ConfirmationGuard<Subject> = ConfirmationGuard::new(validator.clone());

        let err = guard.check(Some(&Subject("u1")), None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_result_is_validator_verdict() {
        for verdict in [true, false] {
            let guard: ConfirmationGuard<Subject> = ConfirmationGuard::new(fixed(verdict));
            let result = guard.check(Some(&Subject("u1")), Some("payload")).await;
            assert_eq!(result.unwrap(), verdict);
        }
    }

    #[tokio::test]
    async fn test_token_validator() {
        let tokens = TokenService::new(&test_auth_config()).unwrap();
        let guard: ConfirmationGuard<Subject> =
            ConfirmationGuard::new(Arc::new(TokenConfirmationValidator::new(tokens.clone())));

        let own = tokens.issue(TokenPurpose::PasswordConfirmation, "u1").unwrap();
        assert!(guard.check(Some(&Subject("u1")), Some(own.token.as_str())).await.unwrap());
        assert!(!guard.check(Some(&Subject("u2")), Some(own.token.as_str())).await.unwrap());

        let access = tokens.issue(TokenPurpose::AccessToken, "u1").unwrap();
        let err = guard
            .check(Some(&Subject("u1")), Some(access.token.as_str()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }
}
