//! # License API (issuer)
//!
//! - `GET        /licenses`             — All licenses, paginated
//! - `GET|POST   /licenses/:license_id` — Partial license, or a regenerated one
//! - `PATCH      /licenses/:license_id` — Rights update and re-signing
//!
//! A fetch without a usable license in the body answers `206 Partial
//! Content` with the key-less view. A body carrying user data and a user
//! key regenerates the license for that holder.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use lcp_core::License;
use lcp_license::{partial_license, LicenseError};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, PageParams};
use crate::routes::{license_response, pagination_headers};
use crate::state::IssuerState;

pub fn router() -> Router<IssuerState> {
    Router::new().route("/licenses", get(list_licenses)).route(
        "/licenses/:license_id",
        get(fetch_license)
            .post(fetch_license)
            .patch(update_license),
    )
}

/// GET /licenses — All licenses, newest first.
#[utoipa::path(
    get,
    path = "/licenses",
    params(PageParams),
    responses(
        (status = 200, description = "Partial licenses; `Link` header with next/previous pages"),
        (status = 400, description = "Bad paging parameters", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "licenses"
)]
pub(crate) async fn list_licenses(
    State(state): State<IssuerState>,
    uri: Uri,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let (page, per_page) = extract_query(query, None)?.resolve()?;
    let licenses: Vec<License> = state
        .licenses
        .list(None, page, per_page)
        .iter()
        .map(partial_license)
        .collect();
    let headers = pagination_headers(uri.path(), page, per_page, licenses.len(), "");
    Ok((headers, Json(licenses)).into_response())
}

/// GET|POST /licenses/:license_id — Fetch a license.
#[utoipa::path(
    post,
    path = "/licenses/{license_id}",
    params(("license_id" = String, Path, description = "License identifier")),
    responses(
        (status = 200, description = "License regenerated with the supplied user data"),
        (status = 206, description = "Partial license without key material"),
        (status = 400, description = "User data missing from the body", body = crate::error::Problem),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "licenses"
)]
pub(crate) async fn fetch_license(
    State(state): State<IssuerState>,
    Path(license_id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let record = state
        .licenses
        .get(&license_id)
        .ok_or_else(|| AppError::NotFound(format!("license {license_id}")))?;

    let input = match parse_license_input(&body) {
        Some(input) => input,
        None => {
            tracing::debug!(license_id = %license_id, "no license input, returning partial license");
            return license_response(
                StatusCode::PARTIAL_CONTENT,
                &partial_license(&record.license),
            );
        }
    };

    let content = state
        .contents
        .get(&record.content_id)
        .ok_or_else(|| LicenseError::ContentNotFound(record.content_id.clone()))?;
    let mut license = record.license;
    state.builder.rebuild_license(&mut license, &content, &input)?;
    tracing::info!(license_id = %license_id, "license regenerated");
    license_response(StatusCode::OK, &license)
}

/// An empty or unparsable body means "no input".
fn parse_license_input(body: &[u8]) -> Option<License> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// PATCH /licenses/:license_id — Update rights and re-sign.
///
/// Only `rights.print`, `rights.copy`, `rights.start`, `rights.end` and
/// `provider` are taken from the body.
#[utoipa::path(
    patch,
    path = "/licenses/{license_id}",
    params(("license_id" = String, Path, description = "License identifier")),
    request_body(
        content = crate::routes::LicenseDocument,
        description = "Rights patch: `id`, optional `provider` and `rights`",
        content_type = "application/vnd.readium.lcp.license.v1.0+json"
    ),
    responses(
        (status = 200, description = "Updated partial license"),
        (status = 400, description = "Malformed patch", body = crate::error::Problem),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "licenses"
)]
pub(crate) async fn update_license(
    State(state): State<IssuerState>,
    Path(license_id): Path<String>,
    body: Result<Json<License>, JsonRejection>,
) -> Result<Response, AppError> {
    let patch = extract_json(body)?;
    if !patch.id.is_empty() && patch.id != license_id {
        return Err(AppError::bad_request(format!(
            "license id {} does not match the path",
            patch.id
        )));
    }
    let mut license = state
        .licenses
        .get(&license_id)
        .ok_or_else(|| AppError::NotFound(format!("license {license_id}")))?
        .license;

    state.builder.update_rights(&mut license, &patch)?;
    state.licenses.update(license.clone())?;
    tracing::info!(
        license_id = %license_id,
        end = ?license.rights.end.map(|e| e.to_rfc3339()),
        "license rights updated"
    );
    license_response(StatusCode::OK, &partial_license(&license))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_garbage_body_is_no_input() {
        assert!(parse_license_input(b"").is_none());
        assert!(parse_license_input(b"  \n").is_none());
        assert!(parse_license_input(b"{not json").is_none());
        let input = parse_license_input(br#"{"user": {"email": "a@b.c"}}"#).unwrap();
        assert_eq!(input.user.email.as_deref(), Some("a@b.c"));
    }
}
