//! # License Status API
//!
//! Public routes, called by reading applications:
//!
//! - `GET  /licenses/:license_id`          — Fresh license
//! - `GET  /licenses/:license_id/status`   — Status document
//! - `POST /licenses/:license_id/register` — Register a device
//! - `PUT  /licenses/:license_id/return`   — Return a loan
//! - `PUT  /licenses/:license_id/renew`    — Extend a loan
//!
//! Privileged routes, called by the issuer and the provider:
//!
//! - `POST  /licenses`                       — Create a status record
//! - `GET   /licenses`                       — Filter by device count
//! - `PATCH /licenses/:license_id/status`    — Cancel or revoke
//! - `GET   /licenses/:license_id/registered` — Registered devices
//!
//! Every transition runs under the license's lock: read the record, apply
//! lazy expiry, compute the transition, push a new rights end to the
//! issuer, then commit the record and its event. An issuer failure aborts
//! before anything is written.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use lcp_core::{License, Timestamp};
use lcp_state::event::last_event_for_device;
use lcp_state::{
    DeviceFilter, LicenseStatus, Operation, RegisteredDevices, StatusDocument, StatusError,
    StatusKind, TransactionEvent, Transition,
};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, DeviceParams};
use crate::routes::{license_response, pagination_headers, status_json};
use crate::state::StatusState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `PATCH /licenses/:license_id/status`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct StatusChangeRequest {
    /// `cancelled` or `revoked`.
    pub status: String,
}

/// `?devices=&page=&per_page=` of the device-count filter.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// Minimum number of registered devices (default 1).
    pub devices: Option<u32>,
    pub page: Option<u32>,
    /// Page size (default 10).
    pub per_page: Option<u32>,
}

/// One entry of the device-count listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusSummary {
    pub id: String,
    pub status: String,
    #[schema(value_type = String, format = DateTime)]
    pub updated: Timestamp,
}

impl From<&LicenseStatus> for StatusSummary {
    fn from(status: &LicenseStatus) -> Self {
        Self {
            id: status.license_ref.clone(),
            status: status.status.as_str().to_string(),
            updated: status.status_updated,
        }
    }
}

// ---------------------------------------------------------------------------
// Routers
// ---------------------------------------------------------------------------

/// Routes open to reading applications.
pub fn public_router() -> Router<StatusState> {
    Router::new()
        .route("/licenses/:license_id", get(fresh_license))
        .route("/licenses/:license_id/status", get(get_status))
        .route("/licenses/:license_id/register", post(register_device))
        .route("/licenses/:license_id/return", put(return_license))
        .route("/licenses/:license_id/renew", put(renew_license))
}

/// Routes behind Basic authentication.
pub fn privileged_router() -> Router<StatusState> {
    Router::new()
        .route("/licenses", post(create_status).get(filter_statuses))
        .route("/licenses/:license_id/status", patch(change_status))
        .route("/licenses/:license_id/registered", get(registered_devices))
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// GET /licenses/:license_id/status — Status document, after lazy expiry.
#[utoipa::path(
    get,
    path = "/licenses/{license_id}/status",
    params(("license_id" = String, Path, description = "License identifier")),
    responses(
        (status = 200, description = "Status document (application/vnd.readium.license.status.v1.0+json)"),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
    ),
    tag = "status"
)]
pub(crate) async fn get_status(
    State(state): State<StatusState>,
    Path(license_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let _guard = state.locks.acquire(&license_id).await;
    let current = load_current(&state, &license_id, Timestamp::now())?;
    render_status(&state, &current, &headers)
}

/// POST /licenses/:license_id/register — Register a device.
#[utoipa::path(
    post,
    path = "/licenses/{license_id}/register",
    params(("license_id" = String, Path, description = "License identifier"), DeviceParams),
    responses(
        (status = 200, description = "Status document after registration"),
        (status = 400, description = "Bad device or license not registrable", body = crate::error::Problem),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
    ),
    tag = "status"
)]
pub(crate) async fn register_device(
    State(state): State<StatusState>,
    Path(license_id): Path<String>,
    headers: HeaderMap,
    query: Result<Query<DeviceParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let result: Result<Response, AppError> = async {
        let params = extract_query(query, Some(Operation::Register))?;
        let device = params.device().unwrap_or_default();
        run_transition(&state, &license_id, &headers, |current, history, now| {
            let last = last_event_for_device(history, &device.id);
            current.register(&device, last, now)
        })
        .await
    }
    .await;
    state.record_compliance(Operation::Register.as_str(), result.is_ok());
    result
}

/// PUT /licenses/:license_id/return — Return a loan.
#[utoipa::path(
    put,
    path = "/licenses/{license_id}/return",
    params(("license_id" = String, Path, description = "License identifier"), DeviceParams),
    responses(
        (status = 200, description = "Status document after return"),
        (status = 400, description = "Bad device or device not active", body = crate::error::Problem),
        (status = 403, description = "Already returned, expired, cancelled or revoked", body = crate::error::Problem),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
        (status = 500, description = "Issuer update failed", body = crate::error::Problem),
    ),
    tag = "status"
)]
pub(crate) async fn return_license(
    State(state): State<StatusState>,
    Path(license_id): Path<String>,
    headers: HeaderMap,
    query: Result<Query<DeviceParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let result: Result<Response, AppError> = async {
        let params = extract_query(query, Some(Operation::Return))?;
        let device = params.device();
        run_transition(&state, &license_id, &headers, |current, history, now| {
            let last = device
                .as_ref()
                .and_then(|d| last_event_for_device(history, &d.id));
            current.return_license(device.as_ref(), last, now)
        })
        .await
    }
    .await;
    state.record_compliance(Operation::Return.as_str(), result.is_ok());
    result
}

/// PUT /licenses/:license_id/renew — Extend a loan.
///
/// Without `end` the loan is extended by the configured renewal period.
#[utoipa::path(
    put,
    path = "/licenses/{license_id}/renew",
    params(("license_id" = String, Path, description = "License identifier"), DeviceParams),
    responses(
        (status = 200, description = "Status document after renewal"),
        (status = 400, description = "Bad device, bad date or license not active", body = crate::error::Problem),
        (status = 403, description = "Renewal outside the allowed period", body = crate::error::Problem),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
        (status = 500, description = "Issuer update failed", body = crate::error::Problem),
    ),
    tag = "status"
)]
pub(crate) async fn renew_license(
    State(state): State<StatusState>,
    Path(license_id): Path<String>,
    headers: HeaderMap,
    query: Result<Query<DeviceParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let result: Result<Response, AppError> = async {
        let params = extract_query(query, Some(Operation::Renew))?;
        let requested_end = params.end()?;
        let device = params.device();
        let renew_days = state.policy.renew_days;
        run_transition(&state, &license_id, &headers, |current, history, now| {
            let last = device
                .as_ref()
                .and_then(|d| last_event_for_device(history, &d.id));
            current.renew(device.as_ref(), last, requested_end, renew_days, now)
        })
        .await
    }
    .await;
    state.record_compliance(Operation::Renew.as_str(), result.is_ok());
    result
}

/// GET /licenses/:license_id — The license, re-signed with the user's
/// current data from the content management system.
#[utoipa::path(
    get,
    path = "/licenses/{license_id}",
    params(("license_id" = String, Path, description = "License identifier")),
    responses(
        (status = 200, description = "Fresh license (application/vnd.readium.lcp.license.v1.0+json)"),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
        (status = 500, description = "CMS or issuer failure", body = crate::error::Problem),
    ),
    tag = "status"
)]
pub(crate) async fn fresh_license(
    State(state): State<StatusState>,
    Path(license_id): Path<String>,
) -> Result<Response, AppError> {
    if state.statuses.get(&license_id).is_none() {
        return Err(AppError::NotFound(format!("license status {license_id}")));
    }
    let license = state.sync.fresh_licenses()?.fresh_license(&license_id).await?;
    license_response(StatusCode::OK, &license)
}

// ---------------------------------------------------------------------------
// Privileged handlers
// ---------------------------------------------------------------------------

/// POST /licenses — Create the status record of a new license.
#[utoipa::path(
    post,
    path = "/licenses",
    request_body(
        content = crate::routes::LicenseDocument,
        description = "Signed license issued by the license server",
        content_type = "application/vnd.readium.lcp.license.v1.0+json"
    ),
    responses(
        (status = 201, description = "Status record created"),
        (status = 400, description = "Malformed license or duplicate record", body = crate::error::Problem),
        (status = 401, description = "Missing or bad credentials", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "status"
)]
pub(crate) async fn create_status(
    State(state): State<StatusState>,
    body: Result<Json<License>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let license = extract_json(body)?;
    let status = LicenseStatus::from_license(&license, &state.policy, Timestamp::now())?;
    let status_kind = status.status;
    state.statuses.insert(status)?;
    tracing::info!(license_id = %license.id, status = %status_kind, "license status created");
    Ok(StatusCode::CREATED)
}

/// PATCH /licenses/:license_id/status — Provider cancellation or revocation.
#[utoipa::path(
    patch,
    path = "/licenses/{license_id}/status",
    params(("license_id" = String, Path, description = "License identifier")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status document after the change"),
        (status = 400, description = "Unsupported status or transition", body = crate::error::Problem),
        (status = 401, description = "Missing or bad credentials", body = crate::error::Problem),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
        (status = 500, description = "Issuer update failed", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "status"
)]
pub(crate) async fn change_status(
    State(state): State<StatusState>,
    Path(license_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = extract_json(body).map_err(|e| match e {
        AppError::BadInput { detail, .. } => AppError::bad_operation(Operation::Cancel, detail),
        other => other,
    })?;
    let (operation, target) = match request.status.as_str() {
        "cancelled" => (Operation::Cancel, StatusKind::Cancelled),
        "revoked" => (Operation::Revoke, StatusKind::Revoked),
        other => {
            return Err(AppError::bad_operation(
                Operation::Cancel,
                format!("status {other:?} cannot be set; expected \"cancelled\" or \"revoked\""),
            ))
        }
    };
    let result = run_transition(&state, &license_id, &headers, |current, _, now| {
        match target {
            StatusKind::Cancelled => current.cancel(now),
            _ => current.revoke(now),
        }
    })
    .await;
    state.record_compliance(operation.as_str(), result.is_ok());
    result
}

/// GET /licenses — Status records with at least `devices` registered devices.
#[utoipa::path(
    get,
    path = "/licenses",
    params(FilterParams),
    responses(
        (status = 200, description = "Matching records; `Link` header with next/previous pages", body = Vec<StatusSummary>),
        (status = 400, description = "Bad filter parameters", body = crate::error::Problem),
        (status = 401, description = "Missing or bad credentials", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "status"
)]
pub(crate) async fn filter_statuses(
    State(state): State<StatusState>,
    uri: Uri,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let params = extract_query(query, Some(Operation::Filter))?;
    let filter = DeviceFilter::new(params.devices, params.page, params.per_page)?;
    let page: Vec<StatusSummary> = state
        .statuses
        .list(&filter)
        .iter()
        .map(StatusSummary::from)
        .collect();
    let headers = pagination_headers(
        uri.path(),
        filter.page,
        filter.per_page,
        page.len(),
        &format!("devices={}&", filter.devices),
    );
    Ok((headers, Json(page)).into_response())
}

/// GET /licenses/:license_id/registered — Devices that registered the license.
#[utoipa::path(
    get,
    path = "/licenses/{license_id}/registered",
    params(("license_id" = String, Path, description = "License identifier")),
    responses(
        (status = 200, description = "Registered devices"),
        (status = 401, description = "Missing or bad credentials", body = crate::error::Problem),
        (status = 404, description = "Unknown license", body = crate::error::Problem),
    ),
    security(("basic_auth" = [])),
    tag = "status"
)]
pub(crate) async fn registered_devices(
    State(state): State<StatusState>,
    Path(license_id): Path<String>,
) -> Result<Json<RegisteredDevices>, AppError> {
    if state.statuses.get(&license_id).is_none() {
        return Err(AppError::NotFound(format!("license status {license_id}")));
    }
    let events = state.events.list_for(&license_id);
    Ok(Json(RegisteredDevices::from_events(&license_id, &events)))
}

// ---------------------------------------------------------------------------
// Transition pipeline
// ---------------------------------------------------------------------------

/// The stored record, moved to EXPIRED first when its end has passed.
/// Callers hold the license lock.
fn load_current(
    state: &StatusState,
    license_id: &str,
    now: Timestamp,
) -> Result<LicenseStatus, AppError> {
    let current = state
        .statuses
        .get(license_id)
        .ok_or_else(|| AppError::NotFound(format!("license status {license_id}")))?;
    match current.expire_if_due(now) {
        Some(expired) => {
            state.statuses.update(expired.clone())?;
            tracing::info!(license_id = %license_id, "license expired");
            Ok(expired)
        }
        None => Ok(current),
    }
}

/// Apply one transition and answer with the resulting status document.
async fn run_transition<F>(
    state: &StatusState,
    license_id: &str,
    headers: &HeaderMap,
    transition: F,
) -> Result<Response, AppError>
where
    F: FnOnce(&LicenseStatus, &[TransactionEvent], Timestamp) -> Result<Transition, StatusError>,
{
    let _guard = state.locks.acquire(license_id).await;
    let now = Timestamp::now();
    let current = load_current(state, license_id, now)?;
    let history = state.events.list_for(license_id);

    let Transition {
        next,
        event,
        sync_end,
    } = transition(&current, &history, now)?;

    if let Some(end) = sync_end {
        state.sync.issuer().update_rights_end(license_id, end).await?;
    }
    if next != current {
        state.statuses.update(next.clone())?;
    }
    if let Some(event) = event {
        state.events.append(event);
    }
    render_status(state, &next, headers)
}

fn render_status(
    state: &StatusState,
    status: &LicenseStatus,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let language = state.localizer.for_headers(headers);
    let events = state.events.list_for(&status.license_ref);
    let document = StatusDocument::render(
        status,
        &events,
        &state.policy,
        &state.links,
        state.localizer.status_message(language, status.status),
    );
    status_json(StatusCode::OK, &document)
}
