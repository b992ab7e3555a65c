//! Device-count filter over status records.

use crate::error::{Operation, StatusError};
use crate::status::LicenseStatus;

/// Paged query for status records with at least `devices` registered
/// devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFilter {
    pub devices: u32,
    pub page: u32,
    pub per_page: u32,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            devices: 1,
            page: 1,
            per_page: 10,
        }
    }
}

impl DeviceFilter {
    /// Build a filter from optional query values; absent values take the
    /// defaults, and every value must be at least 1.
    pub fn new(
        devices: Option<u32>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Self, StatusError> {
        let defaults = Self::default();
        let filter = Self {
            devices: devices.unwrap_or(defaults.devices),
            page: page.unwrap_or(defaults.page),
            per_page: per_page.unwrap_or(defaults.per_page),
        };
        for (name, value) in [
            ("devices", filter.devices),
            ("page", filter.page),
            ("per_page", filter.per_page),
        ] {
            if value < 1 {
                return Err(StatusError::BadInput {
                    operation: Operation::Filter,
                    reason: format!("{name} must be at least 1"),
                });
            }
        }
        Ok(filter)
    }

    pub fn matches(&self, status: &LicenseStatus) -> bool {
        status.device_count >= self.devices
    }

    /// Number of matching records to skip.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.per_page as usize)
    }

    /// Select the requested page from `records`, in their given order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<LicenseStatus>
    where
        I: IntoIterator<Item = &'a LicenseStatus>,
    {
        records
            .into_iter()
            .filter(|s| self.matches(s))
            .skip(self.offset())
            .take(self.per_page as usize)
            .cloned()
            .collect()
    }
}
