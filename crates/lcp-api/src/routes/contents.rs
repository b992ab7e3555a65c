//! # Content API (issuer)
//!
//! - `PUT  /contents/:content_id`          — Register or replace an encrypted publication
//! - `GET  /contents`                      — List registered contents
//! - `POST /contents/:content_id/license`  — Generate a license for a content
//! - `GET  /contents/:content_id/licenses` — Licenses issued for a content

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use lcp_core::{encoding, Content, ContentKeyBytes, License};
use lcp_license::{partial_license, LicenseError};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, PageParams};
use crate::routes::{license_response, pagination_headers};
use crate::state::{IssuerState, LicenseRecord};

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// An encrypted publication as announced by the packaging tool.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContentRequest {
    /// Must match the path when present.
    #[serde(rename = "content-id", default)]
    pub content_id: String,
    /// Base64 content master key (32 bytes).
    #[serde(rename = "content-encryption-key")]
    pub content_encryption_key: String,
    #[serde(rename = "protected-content-location")]
    pub location: String,
    #[serde(rename = "protected-content-length", default)]
    pub length: Option<u64>,
    #[serde(rename = "protected-content-sha256", default)]
    pub sha256: Option<String>,
}

/// A registered content, without its key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentResponse {
    pub id: String,
    pub location: String,
    pub length: u64,
    pub sha256: String,
}

impl From<&Content> for ContentResponse {
    fn from(content: &Content) -> Self {
        Self {
            id: content.id.clone(),
            location: content.location.clone(),
            length: content.length,
            sha256: content.sha256.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<IssuerState> {
    Router::new()
        .route("/contents", get(list_contents))
        .route("/contents/:content_id", put(store_content))
        .route("/contents/:content_id/license", post(generate_license))
        .route("/contents/:content_id/licenses", get(list_content_licenses))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// PUT /contents/:content_id — Register an encrypted publication.
#[utoipa::path(
    put,
    path = "/contents/{content_id}",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body = ContentRequest,
    responses(
        (status = 201, description = "Content registered", body = ContentResponse),
        (status = 200, description = "Content replaced", body = ContentResponse),
        (status = 400, description = "Malformed content", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "contents"
)]
pub(crate) async fn store_content(
    State(state): State<IssuerState>,
    Path(content_id): Path<String>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContentResponse>), AppError> {
    let req = extract_json(body)?;
    if !req.content_id.is_empty() && req.content_id != content_id {
        return Err(AppError::bad_request(format!(
            "content-id {} does not match the path",
            req.content_id
        )));
    }
    let mut key = encoding::decode("content-encryption-key", &req.content_encryption_key)?;
    let encryption_key = ContentKeyBytes::from_slice(&key);
    zeroize::Zeroize::zeroize(&mut key);

    let content = Content {
        id: content_id,
        encryption_key: encryption_key?,
        location: req.location,
        length: req.length.unwrap_or_default(),
        sha256: req.sha256.unwrap_or_default(),
    };
    let response = ContentResponse::from(&content);
    let created = state.contents.put(content);
    tracing::info!(content_id = %response.id, created, "content stored");

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

/// GET /contents — List registered contents.
#[utoipa::path(
    get,
    path = "/contents",
    responses((status = 200, description = "Registered contents", body = Vec<ContentResponse>)),
    security(("basic_auth" = [])),
    tag = "contents"
)]
pub(crate) async fn list_contents(State(state): State<IssuerState>) -> Json<Vec<ContentResponse>> {
    Json(state.contents.list().iter().map(ContentResponse::from).collect())
}

/// POST /contents/:content_id/license — Generate and sign a license.
///
/// The body is a partial license carrying the user, the user key
/// (`value` or `clear_value`) and optionally rights.
#[utoipa::path(
    post,
    path = "/contents/{content_id}/license",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body(
        content = crate::routes::LicenseDocument,
        description = "License request: user, user key material and optional rights",
        content_type = "application/vnd.readium.lcp.license.v1.0+json"
    ),
    responses(
        (status = 201, description = "Signed license (application/vnd.readium.lcp.license.v1.0+json)"),
        (status = 400, description = "Missing user key", body = crate::error::Problem),
        (status = 404, description = "Unknown content", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "licenses"
)]
pub(crate) async fn generate_license(
    State(state): State<IssuerState>,
    Path(content_id): Path<String>,
    body: Result<Json<License>, JsonRejection>,
) -> Result<Response, AppError> {
    let mut license = extract_json(body)?;
    let content = state
        .contents
        .get(&content_id)
        .ok_or_else(|| LicenseError::ContentNotFound(content_id.clone()))?;

    state.builder.complete_license(&mut license, &content)?;
    state.licenses.insert(LicenseRecord {
        license: license.clone(),
        content_id: content_id.clone(),
    })?;
    tracing::info!(license_id = %license.id, content_id = %content_id, "license generated");

    if let Some(notifier) = &state.notifier {
        notifier.notify(license.clone());
    }
    license_response(StatusCode::CREATED, &license)
}

/// GET /contents/:content_id/licenses — Licenses of one content, paginated.
#[utoipa::path(
    get,
    path = "/contents/{content_id}/licenses",
    params(("content_id" = String, Path, description = "Content identifier"), PageParams),
    responses(
        (status = 200, description = "Partial licenses, newest first"),
        (status = 400, description = "Bad paging parameters", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "licenses"
)]
pub(crate) async fn list_content_licenses(
    State(state): State<IssuerState>,
    Path(content_id): Path<String>,
    uri: Uri,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let (page, per_page) = extract_query(query, None)?.resolve()?;
    let licenses: Vec<License> = state
        .licenses
        .list(Some(&content_id), page, per_page)
        .iter()
        .map(partial_license)
        .collect();
    let headers = pagination_headers(uri.path(), page, per_page, licenses.len(), "");
    Ok((headers, Json(licenses)).into_response())
}
