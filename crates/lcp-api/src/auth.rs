//! # Authentication Middleware
//!
//! HTTP Basic authentication for privileged endpoints. Reading-application
//! endpoints of the status service and the health checks are mounted
//! outside this layer.
//!
//! The expected credentials travel in an [`AuthConfig`] request extension.
//! When no username is configured, authentication is disabled.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use lcp_sync::Credentials;

use crate::error::AppError;

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// `Credentials` redacts the password in `Debug` and wipes it on drop.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    credentials: Option<Credentials>,
}

impl AuthConfig {
    /// Require `credentials`; an empty username disables authentication.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: credentials.is_set().then_some(credentials),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }
}

// ── Credential Validation ───────────────────────────────────────────────────

/// Constant-time comparison of credential parts.
///
/// When lengths differ, performs a dummy comparison to avoid leaking length
/// information through timing variance.
fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Decode the `user:password` pair of a `Basic` authorization header.
pub fn parse_basic(header_value: &str) -> Result<(String, Zeroizing<String>), &'static str> {
    let encoded = header_value
        .strip_prefix("Basic ")
        .ok_or("authorization header must use Basic scheme")?;
    let decoded = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|_| "malformed Basic credentials")?,
    );
    let pair = std::str::from_utf8(&decoded).map_err(|_| "malformed Basic credentials")?;
    let (user, password) = pair
        .split_once(':')
        .ok_or("malformed Basic credentials")?;
    Ok((user.to_string(), Zeroizing::new(password.to_string())))
}

fn credentials_match(user: &str, password: &str, expected: &Credentials) -> bool {
    // Both halves are always compared.
    let user_ok = constant_time_eq(user, &expected.username);
    let password_ok = constant_time_eq(password, &expected.password);
    user_ok & password_ok
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Check the `Authorization` header against the configured credentials.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();
    let Some(expected) = config.credentials.as_ref() else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header.map(parse_basic) {
        Some(Ok((user, password))) if credentials_match(&user, &password, expected) => {
            next.run(request).await
        }
        Some(Ok((user, _))) => {
            tracing::warn!(user = %user, path = %request.uri().path(), "authentication failed: invalid credentials");
            AppError::Unauthorized("invalid credentials".into()).into_response()
        }
        Some(Err(msg)) => {
            tracing::warn!(reason = msg, "authentication failed");
            AppError::Unauthorized(msg.into()).into_response()
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "authentication failed: missing authorization header");
            AppError::Unauthorized("missing authorization header".into()).into_response()
        }
    }
}
