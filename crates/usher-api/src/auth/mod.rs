// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Signed-token codec and the token lifecycle
//! - Signed-cookie credential transport
//! - Step-up password confirmation
//! - The permission map and the requirement evaluator

pub mod codec;
mod confirmation;
mod context;
mod evaluator;
mod guard;
pub mod permissions;
mod requirement;
mod tokens;
mod transport;

pub use codec::{TokenClaims, TokenError, TokenPurpose};
pub use confirmation::{ConfirmationGuard, ConfirmationValidator, TokenConfirmationValidator};
pub use context::{AuthContext, ContextIdentityResolver, Principal, UserPermissionProvider};
pub use evaluator::{Authorizer, RequestParams};
pub use guard::{IdentityResolver, PermissionGuard, PermissionProvider, RoutePolicy};
pub use permissions::{Arguments, Decision, PermissionContainer, PermissionNode};
pub use requirement::{Bindings, Requirement};
pub use tokens::{IssuedToken, TokenPair, TokenService};
pub use transport::CredentialCookies;
