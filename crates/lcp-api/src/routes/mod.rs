//! # Route Modules
//!
//! - `contents`, `licenses`: the issuer (`lcpserver`).
//! - `status`, `compliance`: the status service (`lsdserver`).
//!
//! Shared response helpers for the two license-related media types and the
//! pagination `Link` header live here.

pub mod compliance;
pub mod contents;
pub mod licenses;
pub mod status;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use lcp_core::license::{LICENSE_CONTENT_TYPE, STATUS_CONTENT_TYPE};
use lcp_core::License;

use crate::error::AppError;

/// `Content-Disposition` of every license response.
pub const LICENSE_DISPOSITION: &str = "attachment; filename=\"license.lcpl\"";

/// A license document in request bodies: user, encryption, rights and
/// links members as served by the license server.
#[derive(Debug, Clone, ToSchema)]
#[schema(value_type = Object)]
pub struct LicenseDocument(pub serde_json::Value);

/// A license with its media type and download file name.
pub(crate) fn license_response(status: StatusCode, license: &License) -> Result<Response, AppError> {
    let body = serde_json::to_vec(license)
        .map_err(|e| AppError::Internal(format!("license serialization: {e}")))?;
    Ok((
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(LICENSE_CONTENT_TYPE)),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(LICENSE_DISPOSITION),
            ),
        ],
        body,
    )
        .into_response())
}

/// A JSON body served with the status document media type.
pub(crate) fn status_json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, AppError> {
    let body = serde_json::to_vec(value)
        .map_err(|e| AppError::Internal(format!("status document serialization: {e}")))?;
    Ok((
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(STATUS_CONTENT_TYPE))],
        body,
    )
        .into_response())
}

/// `Link` header of a paged listing: `next` when the page is full,
/// `previous` after the first page.
pub(crate) fn pagination_headers(
    path: &str,
    page: u32,
    per_page: u32,
    returned: usize,
    extra_query: &str,
) -> HeaderMap {
    let mut links = Vec::new();
    let page_url = |p: u32| format!("<{path}?{extra_query}page={p}&per_page={per_page}>");
    if returned >= per_page as usize {
        links.push(format!("{}; rel=\"next\"", page_url(page.saturating_add(1))));
    }
    if page > 1 {
        links.push(format!("{}; rel=\"previous\"", page_url(page - 1)));
    }
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&links.join(", ")) {
        if !links.is_empty() {
            headers.insert(header::LINK, value);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_links_next_and_previous() {
        let headers = pagination_headers("/licenses", 2, 10, 10, "");
        assert_eq!(
            headers[header::LINK],
            "</licenses?page=3&per_page=10>; rel=\"next\", </licenses?page=1&per_page=10>; rel=\"previous\""
        );
    }

    #[test]
    fn no_link_header_for_single_short_page() {
        assert!(pagination_headers("/licenses", 1, 30, 3, "").is_empty());
        let headers = pagination_headers("/licenses", 1, 2, 2, "devices=2&");
        assert_eq!(
            headers[header::LINK],
            "</licenses?devices=2&page=2&per_page=2>; rel=\"next\""
        );
    }

    #[test]
    fn license_response_carries_media_type_and_body() {
        let license = License {
            id: "l1".into(),
            ..License::default()
        };
        let response = license_response(StatusCode::CREATED, &license).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], LICENSE_CONTENT_TYPE);
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], LICENSE_DISPOSITION);
    }
}
