//! # lcp-state — License Status State Machine
//!
//! - **Status** (`status.rs`): `StatusKind`, the `LicenseStatus` record and
//!   its transitions (register, return, renew, cancel, revoke, expire).
//!   Transitions are pure: they borrow the stored record and return the
//!   next one.
//! - **Events** (`event.rs`): append-only transaction history and the
//!   registered-devices view.
//! - **Document** (`document.rs`): the status document with its links.
//! - **Filter** (`filter.rs`): paging over records by device count.
//! - **Repository** (`repository.rs`): storage traits.

pub mod document;
pub mod error;
pub mod event;
pub mod filter;
pub mod repository;
pub mod status;

pub use document::{LinkConfig, PotentialRights, StatusDocument, Updated};
pub use error::{Operation, RepositoryError, StatusError};
pub use event::{
    DeviceInfo, EventType, RegisteredDevice, RegisteredDevices, StatusEvent, TransactionEvent,
};
pub use filter::DeviceFilter;
pub use repository::{EventRepository, StatusRepository};
pub use status::{LicenseStatus, StatusKind, StatusPolicy, Transition, MAX_DEVICE_FIELD_LEN};
