//! Transaction events: the append-only device history of a license status.

use serde::{Deserialize, Serialize};

use lcp_core::Timestamp;

/// Device id and name used for events the provider triggers itself.
pub const SYSTEM_DEVICE: &str = "system";

/// Type of a transaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Register,
    Renew,
    Return,
    Revoke,
    Cancel,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Renew => "renew",
            Self::Return => "return",
            Self::Revoke => "revoke",
            Self::Cancel => "cancel",
        }
    }

    /// Whether a device whose last event is `self` currently holds the
    /// license.
    pub fn keeps_device_active(&self) -> bool {
        matches!(self, Self::Register | Self::Renew)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device as identified by the `id` and `name` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
}

impl DeviceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn system() -> Self {
        Self::new(SYSTEM_DEVICE, SYSTEM_DEVICE)
    }
}

/// One entry of a license's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub device_id: String,
    pub device_name: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// `license_ref` of the owning status record.
    pub license_status_fk: String,
}

impl TransactionEvent {
    pub fn new(
        license_ref: &str,
        device: &DeviceInfo,
        event_type: EventType,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            device_id: device.id.clone(),
            device_name: device.name.clone(),
            timestamp,
            event_type,
            license_status_fk: license_ref.to_string(),
        }
    }
}

/// Event as it appears in a status document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub name: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub id: String,
}

impl From<&TransactionEvent> for StatusEvent {
    fn from(event: &TransactionEvent) -> Self {
        Self {
            name: event.device_name.clone(),
            timestamp: event.timestamp,
            event_type: event.event_type,
            id: event.device_id.clone(),
        }
    }
}

// ─── Registered Devices ──────────────────────────────────────────────

/// A device that registered the license, with its registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredDevice {
    pub id: String,
    pub name: String,
    pub timestamp: Timestamp,
}

/// Response body of the registered-devices endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredDevices {
    pub id: String,
    pub devices: Vec<RegisteredDevice>,
}

impl RegisteredDevices {
    /// Collect the `register` events of a license, first registration per
    /// device, in history order.
    pub fn from_events(license_ref: &str, events: &[TransactionEvent]) -> Self {
        let mut devices: Vec<RegisteredDevice> = Vec::new();
        for event in events
            .iter()
            .filter(|e| e.event_type == EventType::Register)
        {
            if devices.iter().any(|d| d.id == event.device_id) {
                continue;
            }
            devices.push(RegisteredDevice {
                id: event.device_id.clone(),
                name: event.device_name.clone(),
                timestamp: event.timestamp,
            });
        }
        Self {
            id: license_ref.to_string(),
            devices,
        }
    }
}

/// Last event recorded for `device_id` in `events`, if any.
pub fn last_event_for_device(events: &[TransactionEvent], device_id: &str) -> Option<EventType> {
    events
        .iter()
        .rev()
        .find(|e| e.device_id == device_id)
        .map(|e| e.event_type)
}
