//! # License Status State Machine
//!
//! Tracks what happened to a license after issuance: device registration,
//! loan return, renewal, provider cancellation or revocation, expiry.
//!
//! ## States
//!
//! ```text
//! Ready ──register──▶ Active ──return──▶ Returned
//!   │                  │ ▲
//!   │                  │ └─renew─┘
//!   ├──return/cancel──▶ Cancelled
//!   ├──revoke─────────▶ Revoked ◀──revoke── Active
//!   └──(end passed)───▶ Expired ◀──(end passed)── Active
//! ```
//!
//! Transitions never mutate the record they start from. Each returns a
//! [`Transition`] holding the next record, the event to append and, when
//! the rights end moves, the end date the issuer must be told about. The
//! caller commits the transition only after the issuer accepted the update.

use serde::{Deserialize, Serialize};

use lcp_core::{License, Timestamp};

use crate::error::{Operation, StatusError};
use crate::event::{DeviceInfo, EventType, TransactionEvent};

/// Longest accepted device id or name, in bytes.
pub const MAX_DEVICE_FIELD_LEN: usize = 255;

// ─── Status Kind ─────────────────────────────────────────────────────

/// The lifecycle state of a license status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Issued, no device registered yet.
    Ready,
    /// At least one device registered, or registration is disabled.
    Active,
    /// Loan returned before its end (terminal).
    Returned,
    /// Returned or cancelled before any device registered (terminal).
    Cancelled,
    /// Revoked by the provider (terminal).
    Revoked,
    /// Rights end passed (terminal).
    Expired,
}

impl StatusKind {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ready | Self::Active)
    }

    /// Wire form, as used in status documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }

    pub const ALL: [StatusKind; 6] = [
        Self::Ready,
        Self::Active,
        Self::Returned,
        Self::Cancelled,
        Self::Revoked,
        Self::Expired,
    ];
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ready => "READY",
            Self::Active => "ACTIVE",
            Self::Returned => "RETURNED",
            Self::Cancelled => "CANCELLED",
            Self::Revoked => "REVOKED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

// ─── Policy ──────────────────────────────────────────────────────────

/// Status-service settings that shape creation and renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPolicy {
    /// Registration enabled: new records start `Ready` instead of `Active`.
    pub register: bool,
    pub renew: bool,
    #[serde(rename = "return")]
    pub return_: bool,
    /// Maximum loan length in days from issuance; 0 means the rights end
    /// is also the potential end.
    pub renting_days: u32,
    /// Default renewal period when no explicit end is requested.
    pub renew_days: u32,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            register: true,
            renew: true,
            return_: true,
            renting_days: 0,
            renew_days: 0,
        }
    }
}

// ─── Transition ──────────────────────────────────────────────────────

/// The outcome of a successful status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Record to store.
    pub next: LicenseStatus,
    /// Event to append; `None` for an idempotent re-registration.
    pub event: Option<TransactionEvent>,
    /// New rights end to push to the issuer before committing.
    pub sync_end: Option<Timestamp>,
}

impl Transition {
    /// True when nothing needs to be written.
    pub fn is_noop(&self) -> bool {
        self.event.is_none() && self.sync_end.is_none()
    }
}

// ─── License Status ──────────────────────────────────────────────────

/// Status record of one license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseStatus {
    /// Id of the license this record tracks.
    pub license_ref: String,
    pub status: StatusKind,
    #[serde(skip)]
    pub device_count: u32,
    /// Latest end date a renewal may reach. Fixed at creation.
    pub potential_rights_end: Option<Timestamp>,
    /// Mirror of the license `rights.end`.
    #[serde(skip)]
    pub current_end_license: Option<Timestamp>,
    pub status_updated: Timestamp,
    pub license_updated: Timestamp,
}

impl LicenseStatus {
    /// Create the status record for a freshly issued license.
    pub fn from_license(
        license: &License,
        policy: &StatusPolicy,
        now: Timestamp,
    ) -> Result<Self, StatusError> {
        if license.id.is_empty() {
            return Err(StatusError::bad_input(
                Operation::Register,
                "license has no id",
            ));
        }
        let issued = license.issued.unwrap_or(now);
        let end = license.rights.end;
        let potential_rights_end = match end {
            Some(end) if policy.renting_days > 0 => Some(end.max(issued.plus_days(policy.renting_days))),
            other => other,
        };
        let status = if policy.register {
            StatusKind::Ready
        } else {
            StatusKind::Active
        };
        Ok(Self {
            license_ref: license.id.clone(),
            status,
            device_count: 0,
            potential_rights_end,
            current_end_license: end,
            status_updated: now,
            license_updated: issued,
        })
    }

    /// Register a device (READY, ACTIVE → ACTIVE).
    ///
    /// `last_event` is the last event recorded for this device. A device
    /// that is already registered gets a no-op transition.
    pub fn register(
        &self,
        device: &DeviceInfo,
        last_event: Option<EventType>,
        now: Timestamp,
    ) -> Result<Transition, StatusError> {
        validate_device(Operation::Register, device, true)?;
        self.require_open(Operation::Register)?;
        match last_event {
            Some(EventType::Return) => {
                return Err(StatusError::DeviceReturned {
                    device_id: device.id.clone(),
                })
            }
            Some(e) if e.keeps_device_active() => {
                return Ok(Transition {
                    next: self.clone(),
                    event: None,
                    sync_end: None,
                })
            }
            _ => {}
        }
        let mut next = self.clone();
        next.status = StatusKind::Active;
        next.device_count = next.device_count.saturating_add(1);
        next.status_updated = now;
        Ok(self.transition(next, device, EventType::Register, now, None))
    }

    /// Return the license (READY → CANCELLED, ACTIVE → RETURNED).
    pub fn return_license(
        &self,
        device: Option<&DeviceInfo>,
        last_event: Option<EventType>,
        now: Timestamp,
    ) -> Result<Transition, StatusError> {
        if let Some(device) = device {
            validate_device(Operation::Return, device, false)?;
        }
        let target = match self.status {
            StatusKind::Ready => StatusKind::Cancelled,
            StatusKind::Active => StatusKind::Returned,
            StatusKind::Returned => return Err(StatusError::AlreadyReturned),
            StatusKind::Expired => return Err(StatusError::ReturnExpired),
            state => return Err(StatusError::NotReturnable { state }),
        };
        let device = self.require_active_device(Operation::Return, device, last_event)?;
        let mut next = self.clone();
        next.status = target;
        next.current_end_license = Some(now);
        next.status_updated = now;
        next.license_updated = now;
        Ok(self.transition(next, &device, EventType::Return, now, Some(now)))
    }

    /// Extend the loan (ACTIVE → ACTIVE).
    ///
    /// Without `requested_end` the loan is extended by `renew_days`. The
    /// new end must lie after the current end, not after the potential
    /// end, and not in the past; out-of-bound requests are rejected, never
    /// clamped.
    pub fn renew(
        &self,
        device: Option<&DeviceInfo>,
        last_event: Option<EventType>,
        requested_end: Option<Timestamp>,
        renew_days: u32,
        now: Timestamp,
    ) -> Result<Transition, StatusError> {
        if let Some(device) = device {
            validate_device(Operation::Renew, device, false)?;
        }
        if self.status != StatusKind::Active {
            return Err(StatusError::InvalidTransition {
                operation: Operation::Renew,
                from: self.status,
            });
        }
        let device = self.require_active_device(Operation::Renew, device, last_event)?;
        let potential = self
            .potential_rights_end
            .ok_or(StatusError::NotALoan("potential"))?;
        let current = self
            .current_end_license
            .ok_or(StatusError::NotALoan("current"))?;

        let new_end = match requested_end {
            Some(end) => end,
            None if renew_days == 0 => {
                return Err(StatusError::RenewRejected(
                    "no end date requested and no renewal period configured".to_string(),
                ))
            }
            None => current.plus_days(renew_days),
        };
        if new_end <= current {
            return Err(StatusError::RenewRejected(format!(
                "new end {new_end} is not after the current end {current}"
            )));
        }
        if new_end > potential {
            return Err(StatusError::RenewRejected(format!(
                "new end {new_end} is after the potential end {potential}"
            )));
        }
        if new_end < now {
            return Err(StatusError::RenewRejected(format!(
                "new end {new_end} is in the past"
            )));
        }

        let mut next = self.clone();
        next.current_end_license = Some(new_end);
        next.status_updated = now;
        next.license_updated = now;
        Ok(self.transition(next, &device, EventType::Renew, now, Some(new_end)))
    }

    /// Provider cancellation (READY → CANCELLED).
    pub fn cancel(&self, now: Timestamp) -> Result<Transition, StatusError> {
        if self.status != StatusKind::Ready {
            return Err(StatusError::InvalidTransition {
                operation: Operation::Cancel,
                from: self.status,
            });
        }
        Ok(self.end_now(StatusKind::Cancelled, EventType::Cancel, now))
    }

    /// Provider revocation (READY, ACTIVE → REVOKED).
    pub fn revoke(&self, now: Timestamp) -> Result<Transition, StatusError> {
        self.require_open(Operation::Revoke)?;
        Ok(self.end_now(StatusKind::Revoked, EventType::Revoke, now))
    }

    /// The EXPIRED record, when the current end of an open license has
    /// passed. `None` when nothing changes.
    pub fn expire_if_due(&self, now: Timestamp) -> Option<LicenseStatus> {
        if self.status.is_terminal() {
            return None;
        }
        match self.current_end_license {
            Some(end) if end < now => {
                let mut next = self.clone();
                next.status = StatusKind::Expired;
                next.status_updated = now;
                Some(next)
            }
            _ => None,
        }
    }

    // ─── Internal Helpers ────────────────────────────────────────────

    fn require_open(&self, operation: Operation) -> Result<(), StatusError> {
        if self.status.is_terminal() {
            return Err(StatusError::InvalidTransition {
                operation,
                from: self.status,
            });
        }
        Ok(())
    }

    /// The device to record the event for: the given device, which must
    /// currently hold the license, or an anonymous one.
    fn require_active_device(
        &self,
        operation: Operation,
        device: Option<&DeviceInfo>,
        last_event: Option<EventType>,
    ) -> Result<DeviceInfo, StatusError> {
        match device {
            Some(device) if !device.id.is_empty() => {
                if last_event.is_some_and(|e| e.keeps_device_active()) {
                    Ok(device.clone())
                } else {
                    Err(StatusError::DeviceNotActive {
                        operation,
                        device_id: device.id.clone(),
                    })
                }
            }
            Some(device) => Ok(device.clone()),
            None => Ok(DeviceInfo::default()),
        }
    }

    fn end_now(&self, target: StatusKind, event_type: EventType, now: Timestamp) -> Transition {
        let mut next = self.clone();
        next.status = target;
        next.current_end_license = Some(now);
        next.status_updated = now;
        next.license_updated = now;
        self.transition(next, &DeviceInfo::system(), event_type, now, Some(now))
    }

    fn transition(
        &self,
        next: LicenseStatus,
        device: &DeviceInfo,
        event_type: EventType,
        now: Timestamp,
        sync_end: Option<Timestamp>,
    ) -> Transition {
        tracing::info!(
            license_id = %self.license_ref,
            from = %self.status,
            to = %next.status,
            event = %event_type,
            "license status transition"
        );
        Transition {
            event: Some(TransactionEvent::new(
                &self.license_ref,
                device,
                event_type,
                now,
            )),
            next,
            sync_end,
        }
    }
}

fn validate_device(
    operation: Operation,
    device: &DeviceInfo,
    required: bool,
) -> Result<(), StatusError> {
    if required && (device.id.is_empty() || device.name.is_empty()) {
        return Err(StatusError::bad_input(
            operation,
            "device id and name are required",
        ));
    }
    if device.id.len() > MAX_DEVICE_FIELD_LEN || device.name.len() > MAX_DEVICE_FIELD_LEN {
        return Err(StatusError::bad_input(
            operation,
            format!("device id and name are limited to {MAX_DEVICE_FIELD_LEN} bytes"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcp_core::UserRights;

    const DAY: i64 = 86_400;
    const T0: i64 = 1_700_000_000;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).unwrap()
    }

    fn device(id: &str) -> DeviceInfo {
        DeviceInfo::new(id, format!("{id} reader"))
    }

    fn loan(end_days: i64, renting_days: u32) -> LicenseStatus {
        let license = License {
            id: "lic-1".into(),
            issued: Some(ts(T0)),
            rights: UserRights {
                end: Some(ts(T0 + end_days * DAY)),
                ..UserRights::default()
            },
            ..License::default()
        };
        let policy = StatusPolicy {
            renting_days,
            ..StatusPolicy::default()
        };
        LicenseStatus::from_license(&license, &policy, ts(T0)).unwrap()
    }

    fn active_loan() -> LicenseStatus {
        let ready = loan(10, 30);
        ready.register(&device("d1"), None, ts(T0 + 1)).unwrap().next
    }

    // ── Creation ─────────────────────────────────────────────────────

    #[test]
    fn loan_potential_end_is_max_of_end_and_renting_period() {
        let status = loan(10, 30);
        assert_eq!(status.status, StatusKind::Ready);
        assert_eq!(status.device_count, 0);
        assert_eq!(status.current_end_license, Some(ts(T0 + 10 * DAY)));
        assert_eq!(status.potential_rights_end, Some(ts(T0 + 30 * DAY)));

        let long = loan(60, 30);
        assert_eq!(long.potential_rights_end, Some(ts(T0 + 60 * DAY)));

        let no_renting = loan(10, 0);
        assert_eq!(no_renting.potential_rights_end, Some(ts(T0 + 10 * DAY)));
    }

    #[test]
    fn purchase_has_no_end_dates() {
        let license = License {
            id: "lic-p".into(),
            issued: Some(ts(T0)),
            ..License::default()
        };
        let status =
            LicenseStatus::from_license(&license, &StatusPolicy::default(), ts(T0)).unwrap();
        assert!(status.potential_rights_end.is_none());
        assert!(status.current_end_license.is_none());
        assert_eq!(status.license_updated, ts(T0));
    }

    #[test]
    fn registration_disabled_starts_active() {
        let license = License {
            id: "lic-a".into(),
            ..License::default()
        };
        let policy = StatusPolicy {
            register: false,
            ..StatusPolicy::default()
        };
        let status = LicenseStatus::from_license(&license, &policy, ts(T0)).unwrap();
        assert_eq!(status.status, StatusKind::Active);
    }

    #[test]
    fn device_count_and_current_end_are_not_serialized() {
        let v = serde_json::to_value(active_loan()).unwrap();
        assert!(v.get("device_count").is_none());
        assert!(v.get("current_end_license").is_none());
        assert_eq!(v["status"], "active");
    }

    // ── Register ─────────────────────────────────────────────────────

    #[test]
    fn register_activates_and_counts() {
        let ready = loan(10, 30);
        let t = ready.register(&device("d1"), None, ts(T0 + 5)).unwrap();
        assert_eq!(t.next.status, StatusKind::Active);
        assert_eq!(t.next.device_count, 1);
        assert_eq!(t.next.status_updated, ts(T0 + 5));
        assert!(t.sync_end.is_none());
        let event = t.event.unwrap();
        assert_eq!(event.event_type, EventType::Register);
        assert_eq!(event.device_id, "d1");
        assert_eq!(event.license_status_fk, "lic-1");
    }

    #[test]
    fn second_device_increments_count() {
        let active = active_loan();
        let t = active.register(&device("d2"), None, ts(T0 + 9)).unwrap();
        assert_eq!(t.next.device_count, 2);
        assert_eq!(t.next.status, StatusKind::Active);
    }

    #[test]
    fn registration_is_idempotent() {
        let active = active_loan();
        for last in [EventType::Register, EventType::Renew] {
            let t = active.register(&device("d1"), Some(last), ts(T0 + 9)).unwrap();
            assert!(t.is_noop());
            assert_eq!(t.next, active);
        }
    }

    #[test]
    fn register_requires_device_fields() {
        let ready = loan(10, 30);
        for d in [DeviceInfo::new("", "n"), DeviceInfo::new("i", "")] {
            assert!(matches!(
                ready.register(&d, None, ts(T0)),
                Err(StatusError::BadInput { operation: Operation::Register, .. })
            ));
        }
        let long = DeviceInfo::new("x".repeat(256), "n");
        assert!(matches!(
            ready.register(&long, None, ts(T0)),
            Err(StatusError::BadInput { .. })
        ));
        let limit = DeviceInfo::new("x".repeat(255), "n");
        assert!(ready.register(&limit, None, ts(T0)).is_ok());
    }

    #[test]
    fn returned_device_cannot_register_again() {
        let active = active_loan();
        assert_eq!(
            active.register(&device("d1"), Some(EventType::Return), ts(T0 + 2)),
            Err(StatusError::DeviceReturned {
                device_id: "d1".into()
            })
        );
    }

    // ── Return ───────────────────────────────────────────────────────

    #[test]
    fn return_active_loan() {
        let active = active_loan();
        let now = ts(T0 + 2 * DAY);
        let t = active
            .return_license(Some(&device("d1")), Some(EventType::Register), now)
            .unwrap();
        assert_eq!(t.next.status, StatusKind::Returned);
        assert_eq!(t.next.current_end_license, Some(now));
        assert_eq!(t.next.license_updated, now);
        assert_eq!(t.sync_end, Some(now));
        assert_eq!(t.event.unwrap().event_type, EventType::Return);
    }

    #[test]
    fn return_ready_loan_cancels() {
        let ready = loan(10, 30);
        let t = ready.return_license(None, None, ts(T0 + 1)).unwrap();
        assert_eq!(t.next.status, StatusKind::Cancelled);
    }

    #[test]
    fn return_by_unregistered_device_is_rejected() {
        let active = active_loan();
        assert!(matches!(
            active.return_license(Some(&device("stranger")), None, ts(T0 + 2)),
            Err(StatusError::DeviceNotActive { operation: Operation::Return, .. })
        ));
    }

    #[test]
    fn double_return_is_a_precondition_failure() {
        let active = active_loan();
        let returned = active
            .return_license(None, None, ts(T0 + 2))
            .unwrap()
            .next;
        assert_eq!(
            returned.return_license(None, None, ts(T0 + 3)),
            Err(StatusError::AlreadyReturned)
        );
    }

    // ── Renew ────────────────────────────────────────────────────────

    #[test]
    fn renew_by_default_period() {
        let active = active_loan();
        let t = active
            .renew(None, None, None, 7, ts(T0 + 2 * DAY))
            .unwrap();
        assert_eq!(t.next.current_end_license, Some(ts(T0 + 17 * DAY)));
        assert_eq!(t.sync_end, Some(ts(T0 + 17 * DAY)));
        assert_eq!(t.next.status, StatusKind::Active);
        assert_eq!(t.event.unwrap().event_type, EventType::Renew);
    }

    #[test]
    fn renew_beyond_potential_end_is_rejected() {
        let active = active_loan();
        let err = active
            .renew(None, None, Some(ts(T0 + 31 * DAY)), 0, ts(T0 + DAY))
            .unwrap_err();
        assert!(matches!(err, StatusError::RenewRejected(_)));

        let at_bound = active
            .renew(None, None, Some(ts(T0 + 30 * DAY)), 0, ts(T0 + DAY))
            .unwrap();
        assert_eq!(at_bound.next.current_end_license, Some(ts(T0 + 30 * DAY)));
    }

    #[test]
    fn renew_before_current_end_is_rejected() {
        let active = active_loan();
        for end in [T0 + 5 * DAY, T0 + 10 * DAY] {
            assert!(matches!(
                active.renew(None, None, Some(ts(end)), 0, ts(T0 + DAY)),
                Err(StatusError::RenewRejected(_))
            ));
        }
    }

    #[test]
    fn renew_without_period_or_end_is_rejected() {
        let active = active_loan();
        assert!(matches!(
            active.renew(None, None, None, 0, ts(T0 + DAY)),
            Err(StatusError::RenewRejected(_))
        ));
    }

    #[test]
    fn renew_purchase_is_rejected() {
        let license = License {
            id: "lic-p".into(),
            ..License::default()
        };
        let policy = StatusPolicy {
            register: false,
            ..StatusPolicy::default()
        };
        let status = LicenseStatus::from_license(&license, &policy, ts(T0)).unwrap();
        assert_eq!(
            status.renew(None, None, None, 7, ts(T0)),
            Err(StatusError::NotALoan("potential"))
        );
    }

    #[test]
    fn renew_ready_license_is_invalid() {
        let ready = loan(10, 30);
        assert!(matches!(
            ready.renew(None, None, None, 7, ts(T0)),
            Err(StatusError::InvalidTransition { operation: Operation::Renew, from: StatusKind::Ready })
        ));
    }

    // ── Cancel / Revoke / Expire ─────────────────────────────────────

    #[test]
    fn cancel_and_revoke_are_recorded_by_system() {
        let ready = loan(10, 30);
        let cancelled = ready.cancel(ts(T0 + 1)).unwrap();
        assert_eq!(cancelled.next.status, StatusKind::Cancelled);
        assert_eq!(cancelled.event.as_ref().unwrap().device_id, "system");
        assert_eq!(cancelled.sync_end, Some(ts(T0 + 1)));

        let revoked = active_loan().revoke(ts(T0 + 2)).unwrap();
        assert_eq!(revoked.next.status, StatusKind::Revoked);
        assert_eq!(revoked.event.unwrap().event_type, EventType::Revoke);
    }

    #[test]
    fn cancel_active_license_is_invalid() {
        assert!(matches!(
            active_loan().cancel(ts(T0 + 2)),
            Err(StatusError::InvalidTransition { operation: Operation::Cancel, .. })
        ));
    }

    #[test]
    fn expiry_uses_current_end() {
        let active = active_loan();
        assert!(active.expire_if_due(ts(T0 + 10 * DAY)).is_none());
        let expired = active.expire_if_due(ts(T0 + 10 * DAY + 1)).unwrap();
        assert_eq!(expired.status, StatusKind::Expired);
        assert_eq!(
            expired.return_license(None, None, ts(T0 + 11 * DAY)),
            Err(StatusError::ReturnExpired)
        );
        assert!(expired.expire_if_due(ts(T0 + 20 * DAY)).is_none());
    }

    // ── Totality ─────────────────────────────────────────────────────

    fn in_state(kind: StatusKind) -> LicenseStatus {
        LicenseStatus {
            status: kind,
            ..active_loan()
        }
    }

    #[test]
    fn operations_outside_the_table_fail_without_change() {
        let now = ts(T0 + DAY);
        for kind in StatusKind::ALL {
            let record = in_state(kind);
            let before = record.clone();

            let register = record.register(&device("new"), None, now);
            assert_eq!(register.is_ok(), !kind.is_terminal(), "register from {kind}");

            let ret = record.return_license(None, None, now);
            assert_eq!(ret.is_ok(), !kind.is_terminal(), "return from {kind}");

            let renew = record.renew(None, None, None, 7, now);
            assert_eq!(renew.is_ok(), kind == StatusKind::Active, "renew from {kind}");

            let cancel = record.cancel(now);
            assert_eq!(cancel.is_ok(), kind == StatusKind::Ready, "cancel from {kind}");

            let revoke = record.revoke(now);
            assert_eq!(revoke.is_ok(), !kind.is_terminal(), "revoke from {kind}");

            assert_eq!(record, before);
        }
    }

    proptest::proptest! {
        #[test]
        fn renewal_never_exceeds_potential_end(offset_days in 0i64..90, renew_days in 0u32..60) {
            let active = active_loan();
            let requested = ts(T0 + offset_days * DAY);
            let potential = active.potential_rights_end.unwrap();
            let current = active.current_end_license.unwrap();
            for t in [
                active.renew(None, None, Some(requested), 0, ts(T0 + DAY)),
                active.renew(None, None, None, renew_days, ts(T0 + DAY)),
            ] {
                if let Ok(t) = t {
                    let end = t.next.current_end_license.unwrap();
                    proptest::prop_assert!(end <= potential);
                    proptest::prop_assert!(end > current);
                }
            }
        }
    }
}
