//! # Authentication Module
//!
//! Per-user bearer sessions for the Metas HTTP API.
//!
//! `POST /auth/login` exchanges email + password for an opaque session
//! token; every other endpoint (except `/health`) requires
//! `Authorization: Bearer <token>`. The middleware resolves the token to
//! the caller's stored profile and injects it into the request, so
//! handlers never re-derive identity.
//!
//! Tokens live in process memory with no expiry; restarting the server
//! invalidates every session.

use crate::api::AppState;
use crate::api::types::ApiError;
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use metas_core::{MetasError, Result as CoreResult, UserProfile, password_digest};
use subtle::ConstantTimeEq;

/// Endpoints reachable without a session (load balancer checks, login).
const PUBLIC_PATHS: &[&str] = &["/health", "/auth/login"];

// =============================================================================
// LOGIN
// =============================================================================

/// Mint an opaque session token.
#[must_use]
pub fn mint_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Verify credentials and open a session.
///
/// Unknown email and wrong password produce the same error so the login
/// endpoint does not reveal which emails exist. Digest comparison is
/// constant-time.
pub async fn login(state: &AppState, email: &str, password: &str) -> CoreResult<(String, UserProfile)> {
    let rejected = || MetasError::Unauthenticated("Unknown email or wrong password.".to_string());

    let account = {
        let directory = state.directory.read().await;
        directory.get_account(email.trim())?
    };
    let Some(account) = account else {
        tracing::warn!(event = "auth_failure", reason = "unknown_email", "Login failed");
        return Err(rejected());
    };

    let supplied = password_digest(&account.uid, password);
    let matches: bool = supplied.as_bytes().ct_eq(account.password_hash.as_bytes()).into();
    if !matches {
        tracing::warn!(event = "auth_failure", reason = "bad_password", "Login failed");
        return Err(rejected());
    }

    let profile = {
        let directory = state.directory.read().await;
        directory.get_user(&account.uid)?
    }
    .ok_or_else(|| {
        MetasError::Internal(format!("Account {} has no profile document", account.email))
    })?;

    let token = mint_token();
    state.sessions.write().await.insert(token.clone(), account.uid);
    Ok((token, profile))
}

// =============================================================================
// SESSION MIDDLEWARE
// =============================================================================

/// Bearer session middleware.
///
/// - `/health` and `/auth/login` are always allowed
/// - All other endpoints require a known `Authorization: Bearer <token>`
/// - On success the caller's `UserProfile` is attached as a request
///   extension
pub async fn require_user_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err(ApiError::unauthenticated("Missing Authorization header"));
    };

    let uid = state.sessions.read().await.get(token).cloned();
    let Some(uid) = uid else {
        tracing::warn!(
            event = "auth_failure",
            reason = "unknown_token",
            "Authentication failed: unknown session token"
        );
        return Err(ApiError::unauthenticated("Invalid or expired session token"));
    };

    let profile = {
        let directory = state.directory.read().await;
        directory.get_user(&uid)
    }
    .map_err(ApiError::from)?
    .ok_or_else(|| ApiError::unauthenticated("Session references a missing profile"))?;

    request.extensions_mut().insert(profile);
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================
