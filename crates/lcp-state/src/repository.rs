//! Storage seams for status records and transaction events.
//!
//! The status service depends on these traits only; the HTTP layer injects
//! the concrete stores.

use crate::error::RepositoryError;
use crate::event::{EventType, TransactionEvent};
use crate::filter::DeviceFilter;
use crate::status::LicenseStatus;

/// Persistent status records, keyed by `license_ref`.
pub trait StatusRepository: Send + Sync {
    fn get(&self, license_ref: &str) -> Option<LicenseStatus>;

    /// Insert a new record; a second record for the same license fails
    /// with [`RepositoryError::Duplicate`].
    fn insert(&self, status: LicenseStatus) -> Result<(), RepositoryError>;

    /// Replace an existing record.
    fn update(&self, status: LicenseStatus) -> Result<(), RepositoryError>;

    /// Records matching `filter`, page selected, ordered by `license_ref`.
    fn list(&self, filter: &DeviceFilter) -> Vec<LicenseStatus>;
}

/// Append-only event history.
pub trait EventRepository: Send + Sync {
    fn append(&self, event: TransactionEvent);

    /// Events of one license, oldest first.
    fn list_for(&self, license_ref: &str) -> Vec<TransactionEvent>;

    /// Type of the last event recorded for a device on a license.
    fn last_for_device(&self, license_ref: &str, device_id: &str) -> Option<EventType> {
        crate::event::last_event_for_device(&self.list_for(license_ref), device_id)
    }
}
