use thiserror::Error;

use crate::status::StatusKind;

/// The status-service operation an error belongs to.
///
/// Used by the HTTP layer to pick the problem `type` of a 400 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Return,
    Renew,
    Cancel,
    Revoke,
    Filter,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "registration",
            Self::Return => "return",
            Self::Renew => "renew",
            Self::Cancel => "cancel",
            Self::Revoke => "revoke",
            Self::Filter => "filter",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by status transitions and status queries.
///
/// A transition that fails leaves the stored record untouched: every
/// transition computes its result from a borrowed record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// Malformed device or query parameters.
    #[error("{operation}: {reason}")]
    BadInput {
        operation: Operation,
        reason: String,
    },

    /// The operation is not allowed from the current status.
    #[error("{operation} not allowed from status {from}")]
    InvalidTransition {
        operation: Operation,
        from: StatusKind,
    },

    /// Return of a license that was already returned.
    #[error("license has already been returned")]
    AlreadyReturned,

    /// Return of an expired license.
    #[error("license has expired")]
    ReturnExpired,

    /// Return of a cancelled or revoked license.
    #[error("license is {state} and cannot be returned")]
    NotReturnable { state: StatusKind },

    /// The device named in the request is not registered for the license.
    #[error("{operation}: device {device_id} is not active for this license")]
    DeviceNotActive {
        operation: Operation,
        device_id: String,
    },

    /// The device returned the license earlier and may not register again.
    #[error("device {device_id} has already returned this license")]
    DeviceReturned { device_id: String },

    /// Renewal of a license without an end date (a purchase).
    #[error("license has no {0} end date and cannot be renewed")]
    NotALoan(&'static str),

    /// The requested end date violates the renewal bounds.
    #[error("renewal rejected: {0}")]
    RenewRejected(String),
}

impl StatusError {
    pub(crate) fn bad_input(operation: Operation, reason: impl Into<String>) -> Self {
        Self::BadInput {
            operation,
            reason: reason.into(),
        }
    }
}

/// Errors from the status and event repositories.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("license status {0} not found")]
    NotFound(String),

    #[error("license status {0} already exists")]
    Duplicate(String),

    #[error("license status {0} is final")]
    Final(String),
}
