//! # Request Extraction Helpers
//!
//! Map axum rejections to problem responses instead of axum's plain-text
//! bodies, and parse the query parameters shared by several routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use serde::Deserialize;
use utoipa::IntoParams;

use lcp_core::Timestamp;
use lcp_state::{DeviceInfo, Operation};

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to a 400.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::bad_request(err.body_text()))
}

/// Extract query parameters, typing a rejection for `operation`.
pub fn extract_query<T>(
    result: Result<Query<T>, QueryRejection>,
    operation: Option<Operation>,
) -> Result<T, AppError> {
    result.map(|Query(v)| v).map_err(|err| match operation {
        Some(op) => AppError::bad_operation(op, err.body_text()),
        None => AppError::bad_request(err.body_text()),
    })
}

/// `?id=&name=` of the device acting on a license.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceParams {
    /// Device identifier.
    pub id: Option<String>,
    /// Human-readable device name.
    pub name: Option<String>,
    /// Requested end of a renewal (RFC 3339).
    pub end: Option<String>,
}

impl DeviceParams {
    /// The device, or `None` when neither id nor name was given.
    pub fn device(&self) -> Option<DeviceInfo> {
        if self.id.is_none() && self.name.is_none() {
            return None;
        }
        Some(DeviceInfo::new(
            self.id.clone().unwrap_or_default(),
            self.name.clone().unwrap_or_default(),
        ))
    }

    /// The requested renewal end, if any.
    pub fn end(&self) -> Result<Option<Timestamp>, AppError> {
        match self.end.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => Timestamp::parse(raw)
                .map(Some)
                .map_err(|e| AppError::bad_operation(Operation::Renew, e.to_string())),
        }
    }
}

/// `?page=&per_page=` of the issuer's license listings.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    pub const DEFAULT_PER_PAGE: u32 = 30;

    /// `(page, per_page)` with defaults applied; both must be at least 1.
    pub fn resolve(&self) -> Result<(u32, u32), AppError> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(Self::DEFAULT_PER_PAGE);
        if page < 1 || per_page < 1 {
            return Err(AppError::bad_request("page and per_page must be at least 1"));
        }
        Ok((page, per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_absent_without_params() {
        assert!(DeviceParams::default().device().is_none());
        let params = DeviceParams {
            id: Some("d1".into()),
            ..DeviceParams::default()
        };
        let device = params.device().unwrap();
        assert_eq!(device.id, "d1");
        assert_eq!(device.name, "");
    }

    #[test]
    fn malformed_end_is_a_renew_error() {
        let params = DeviceParams {
            end: Some("next tuesday".into()),
            ..DeviceParams::default()
        };
        let (status, ty) = params.end().unwrap_err().status_and_type();
        assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
        assert!(ty.ends_with("/renew"));
    }

    #[test]
    fn page_defaults_and_bounds() {
        assert_eq!(PageParams::default().resolve().unwrap(), (1, 30));
        let zero = PageParams {
            page: Some(0),
            per_page: None,
        };
        assert!(zero.resolve().is_err());
    }
}
