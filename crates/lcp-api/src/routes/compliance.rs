//! # Compliance Test Control
//!
//! `POST /compliancetest?test_stage=start|end&test_number=&test_result=s|e`
//!
//! Mounted only when compliance mode is enabled. Status operations that run
//! between `start` and `end` are logged against the current test number.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::StatusState;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ComplianceParams {
    /// `start` or `end`.
    pub test_stage: Option<String>,
    /// Test number; required on `start`.
    pub test_number: Option<String>,
    /// `s` (success) or `e` (error); required on `end`.
    pub test_result: Option<String>,
}

pub fn router() -> Router<StatusState> {
    Router::new().route("/compliancetest", post(compliance_test))
}

/// POST /compliancetest — Start or end a compliance test.
#[utoipa::path(
    post,
    path = "/compliancetest",
    params(ComplianceParams),
    responses(
        (status = 200, description = "Stage recorded"),
        (status = 400, description = "Bad stage, number or result", body = crate::error::Problem),
        (status = 404, description = "Compliance mode disabled", body = crate::error::Problem),
    ),
    tag = "compliance"
)]
pub(crate) async fn compliance_test(
    State(state): State<StatusState>,
    query: Result<Query<ComplianceParams>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let params = extract_query(query, None)?;
    let session = state
        .compliance
        .as_ref()
        .ok_or_else(|| AppError::NotFound("compliance mode is disabled".to_string()))?;
    session.handle(
        params.test_stage.as_deref(),
        params.test_number.as_deref(),
        params.test_result.as_deref(),
    )?;
    Ok(StatusCode::OK)
}
