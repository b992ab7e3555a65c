//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every error leaves the service as an `application/problem+json` body
//! whose `type` URI tells a reading application which operation failed.
//! Internal and upstream failures never expose their detail to clients.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use lcp_core::ValidationError;
use lcp_license::LicenseError;
use lcp_state::{Operation, RepositoryError, StatusError};
use lcp_sync::SyncError;

/// Media type of every error body.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Base of the status-service problem type URIs.
pub const PROBLEM_BASE: &str = "http://readium.org/license-status-document/error/";

/// Problem type used when no more specific type applies.
pub const ABOUT_BLANK: &str = "about:blank";

/// Realm announced with `401 Unauthorized`.
pub const AUTH_REALM: &str = "Basic realm=\"Readium LCP Server\"";

/// Problem details body (RFC 7807).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Short summary; the reason phrase of `status`, localized.
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Path of the request that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Full problem type URI for a status-service error kind, e.g.
/// `return/already`.
pub fn problem_type(kind: &str) -> String {
    format!("{PROBLEM_BASE}{kind}")
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request or a transition the current status forbids (400).
    #[error("bad request: {detail}")]
    BadInput { problem_type: String, detail: String },

    /// Unknown license, content or status record (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The license is in a state that rules the request out (403).
    #[error("precondition failed: {detail}")]
    PreconditionFailed { problem_type: String, detail: String },

    /// Missing or wrong Basic credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A peer service failed or could not be reached (500).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 400 with a plain `about:blank` type.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadInput {
            problem_type: ABOUT_BLANK.to_string(),
            detail: detail.into(),
        }
    }

    /// 400 typed for a status-service operation.
    pub fn bad_operation(operation: Operation, detail: impl Into<String>) -> Self {
        Self::BadInput {
            problem_type: problem_type(operation_kind(operation)),
            detail: detail.into(),
        }
    }

    fn precondition(kind: &str, detail: String) -> Self {
        Self::PreconditionFailed {
            problem_type: problem_type(kind),
            detail,
        }
    }

    /// HTTP status and problem type of this error.
    pub fn status_and_type(&self) -> (StatusCode, String) {
        match self {
            Self::BadInput { problem_type, .. } => (StatusCode::BAD_REQUEST, problem_type.clone()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, problem_type("notfound")),
            Self::PreconditionFailed { problem_type, .. } => {
                (StatusCode::FORBIDDEN, problem_type.clone())
            }
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, ABOUT_BLANK.to_string()),
            Self::Upstream(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, problem_type("server"))
            }
        }
    }

    /// The problem body, with the English title and no instance.
    pub fn to_problem(&self) -> Problem {
        let (status, problem_type) = self.status_and_type();
        let detail = match self {
            Self::BadInput { detail, .. } | Self::PreconditionFailed { detail, .. } => {
                detail.clone()
            }
            Self::NotFound(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::Upstream(_) => "An upstream service error occurred".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
        };
        Problem {
            problem_type,
            title: status.canonical_reason().unwrap_or_default().to_string(),
            status: status.as_u16(),
            detail: Some(detail),
            instance: None,
        }
    }
}

/// Problem type suffix of an operation.
fn operation_kind(operation: Operation) -> &'static str {
    match operation {
        Operation::Register => "registration",
        Operation::Return => "return",
        Operation::Renew => "renew",
        Operation::Cancel | Operation::Revoke => "cancel",
        Operation::Filter => "filter",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::error!(error = %self, "upstream service error"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        let problem = self.to_problem();
        let mut response = problem_response(&problem);
        if matches!(self, Self::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_REALM));
        }
        response
    }
}

/// Render `problem` with its status and content type.
///
/// The problem itself rides along in the response extensions so the
/// localization layer can rewrite its title.
pub fn problem_response(problem: &Problem) -> Response {
    let status = StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::to_vec(problem).unwrap_or_default();
    let mut response = (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE))],
        body,
    )
        .into_response();
    response.extensions_mut().insert(problem.clone());
    response
}

// ─── Domain Conversions ──────────────────────────────────────────────

impl From<StatusError> for AppError {
    fn from(err: StatusError) -> Self {
        let detail = err.to_string();
        match err {
            StatusError::BadInput { operation, .. }
            | StatusError::InvalidTransition { operation, .. }
            | StatusError::DeviceNotActive { operation, .. } => {
                Self::bad_operation(operation, detail)
            }
            StatusError::DeviceReturned { .. } => Self::bad_operation(Operation::Register, detail),
            StatusError::AlreadyReturned => Self::precondition("return/already", detail),
            StatusError::ReturnExpired => Self::precondition("return/expired", detail),
            StatusError::NotReturnable { .. } => Self::precondition("return", detail),
            StatusError::NotALoan(_) => Self::precondition("renew", detail),
            StatusError::RenewRejected(_) => Self::precondition("renew/date", detail),
        }
    }
}

impl From<LicenseError> for AppError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::BadLicenseInput(msg) => Self::bad_request(msg),
            LicenseError::ContentNotFound(id) => Self::NotFound(format!("content {id}")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Serialization { .. } => Self::Internal(err.to_string()),
            _ => Self::Upstream(err.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => Self::NotFound(err.to_string()),
            RepositoryError::Duplicate(_) => Self::bad_request(err.to_string()),
            RepositoryError::Final(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use lcp_state::StatusKind;

    async fn response_parts(err: AppError) -> (StatusCode, axum::http::HeaderMap, Problem) {
        let resp = err.into_response();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn transition_errors_typed_by_operation() {
        let err: AppError = StatusError::InvalidTransition {
            operation: Operation::Revoke,
            from: StatusKind::Returned,
        }
        .into();
        let (status, ty) = err.status_and_type();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(ty, "http://readium.org/license-status-document/error/cancel");

        let err: AppError = StatusError::DeviceReturned {
            device_id: "d1".into(),
        }
        .into();
        assert_eq!(err.status_and_type().1, problem_type("registration"));
    }

    #[test]
    fn return_preconditions_are_forbidden() {
        for (err, kind) in [
            (StatusError::AlreadyReturned, "return/already"),
            (StatusError::ReturnExpired, "return/expired"),
            (
                StatusError::RenewRejected("after potential end".into()),
                "renew/date",
            ),
        ] {
            let (status, ty) = AppError::from(err).status_and_type();
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(ty, problem_type(kind));
        }
    }

    #[test]
    fn license_errors_map_by_kind() {
        let (status, _) =
            AppError::from(LicenseError::ContentNotFound("c1".into())).status_and_type();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, ty) =
            AppError::from(LicenseError::BadLicenseInput("no key".into())).status_and_type();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(ty, ABOUT_BLANK);

        let (status, _) = AppError::from(LicenseError::Config("bad".into())).status_and_type();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_detail_not_exposed() {
        let (status, headers, problem) =
            response_parts(AppError::Internal("db password wrong".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::CONTENT_TYPE], PROBLEM_CONTENT_TYPE);
        assert_eq!(problem.title, "Internal Server Error");
        assert!(!problem.detail.unwrap().contains("password"));
    }

    #[tokio::test]
    async fn unauthorized_announces_basic_auth() {
        let (status, headers, problem) =
            response_parts(AppError::Unauthorized("missing credentials".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers[header::WWW_AUTHENTICATE], AUTH_REALM);
        assert_eq!(problem.problem_type, ABOUT_BLANK);
        assert_eq!(problem.status, 401);
    }

    #[tokio::test]
    async fn bad_input_keeps_detail() {
        let (_, _, problem) = response_parts(AppError::bad_operation(
            Operation::Filter,
            "page must be at least 1",
        ))
        .await;
        assert_eq!(problem.problem_type, problem_type("filter"));
        assert_eq!(problem.detail.as_deref(), Some("page must be at least 1"));
        assert!(problem.instance.is_none());
    }

    #[test]
    fn request_serialization_failure_is_internal() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err: AppError = SyncError::Serialization {
            endpoint: "PATCH /licenses/l1".into(),
            source,
        }
        .into();
        assert!(matches!(err, AppError::Internal(_)));

        let err: AppError = SyncError::Timeout {
            endpoint: "PATCH /licenses/l1".into(),
            budget: std::time::Duration::from_secs(10),
        }
        .into();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
