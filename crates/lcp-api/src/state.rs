//! # Application State
//!
//! Shared state of the two services: repositories behind traits, the
//! envelope builder, the synchronizer clients and the per-license locks
//! that serialize status transitions.
//!
//! The in-memory repositories are built on [`Store`], a thread-safe map
//! with an atomic read-validate-update primitive.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use lcp_core::{Content, License};
use lcp_license::{LicenseBuilder, LicenseSigner};
use lcp_state::{
    DeviceFilter, EventRepository, LicenseStatus, LinkConfig, RepositoryError, StatusPolicy,
    StatusRepository, TransactionEvent,
};
use lcp_sync::{StatusNotifier, Synchronizer};

use crate::compliance::ComplianceSession;
use crate::config::{ConfigError, ServerConfig};
use crate::localization::Localizer;

// -- Generic Store ------------------------------------------------------------

/// A thread-safe, cloneable in-memory store keyed by string id.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: &str, value: T) -> Option<T> {
        self.data.write().insert(id.to_string(), value)
    }

    /// Insert only when the key is free. Returns `false` when it was taken.
    pub fn insert_new(&self, id: &str, value: T) -> bool {
        let mut guard = self.data.write();
        if guard.contains_key(id) {
            return false;
        }
        guard.insert(id.to_string(), value);
        true
    }

    /// Retrieve a record by id.
    pub fn get(&self, id: &str) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        f(entry);
        Some(entry.clone())
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under the write lock. Returns `None` if the record
    /// doesn't exist, or `Some(result)` with the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &str,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Update a record, inserting `init()` first when it is missing.
    pub fn upsert(&self, id: &str, init: impl FnOnce() -> T, f: impl FnOnce(&mut T)) {
        let mut guard = self.data.write();
        f(guard.entry(id.to_string()).or_insert_with(init));
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Repository Traits --------------------------------------------------------

/// A stored license and the content it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseRecord {
    pub license: License,
    pub content_id: String,
}

/// Registered contents.
pub trait ContentRepository: Send + Sync {
    fn get(&self, id: &str) -> Option<Content>;

    /// Store or replace a content. Returns `true` when it is new.
    fn put(&self, content: Content) -> bool;

    /// All contents, ordered by id.
    fn list(&self) -> Vec<Content>;
}

/// Issued licenses.
pub trait LicenseRepository: Send + Sync {
    fn get(&self, id: &str) -> Option<LicenseRecord>;

    fn insert(&self, record: LicenseRecord) -> Result<(), RepositoryError>;

    /// Replace the license of an existing record.
    fn update(&self, license: License) -> Result<(), RepositoryError>;

    /// One page of licenses, most recently issued first; `content_id`
    /// restricts the listing to one content.
    fn list(&self, content_id: Option<&str>, page: u32, per_page: u32) -> Vec<License>;
}

// -- In-Memory Repositories ---------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryContents(Store<Content>);

impl ContentRepository for InMemoryContents {
    fn get(&self, id: &str) -> Option<Content> {
        self.0.get(id)
    }

    fn put(&self, content: Content) -> bool {
        let id = content.id.clone();
        self.0.insert(&id, content).is_none()
    }

    fn list(&self) -> Vec<Content> {
        let mut contents = self.0.list();
        contents.sort_by(|a, b| a.id.cmp(&b.id));
        contents
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryLicenses(Store<LicenseRecord>);

impl LicenseRepository for InMemoryLicenses {
    fn get(&self, id: &str) -> Option<LicenseRecord> {
        self.0.get(id)
    }

    fn insert(&self, record: LicenseRecord) -> Result<(), RepositoryError> {
        let id = record.license.id.clone();
        if self.0.insert_new(&id, record) {
            Ok(())
        } else {
            Err(RepositoryError::Duplicate(id))
        }
    }

    fn update(&self, license: License) -> Result<(), RepositoryError> {
        let id = license.id.clone();
        self.0
            .update(&id, |record| record.license = license)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }

    fn list(&self, content_id: Option<&str>, page: u32, per_page: u32) -> Vec<License> {
        let mut records: Vec<LicenseRecord> = self
            .0
            .list()
            .into_iter()
            .filter(|r| content_id.map_or(true, |c| r.content_id == c))
            .collect();
        records.sort_by(|a, b| {
            b.license
                .issued
                .cmp(&a.license.issued)
                .then_with(|| a.license.id.cmp(&b.license.id))
        });
        let offset = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
        records
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .map(|r| r.license)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStatuses(Store<LicenseStatus>);

impl StatusRepository for InMemoryStatuses {
    fn get(&self, license_ref: &str) -> Option<LicenseStatus> {
        self.0.get(license_ref)
    }

    fn insert(&self, status: LicenseStatus) -> Result<(), RepositoryError> {
        let id = status.license_ref.clone();
        if self.0.insert_new(&id, status) {
            Ok(())
        } else {
            Err(RepositoryError::Duplicate(id))
        }
    }

    fn update(&self, status: LicenseStatus) -> Result<(), RepositoryError> {
        let id = status.license_ref.clone();
        self.0
            .try_update(&id, |stored| {
                if stored.status.is_terminal() {
                    return Err(RepositoryError::Final(id.clone()));
                }
                *stored = status;
                Ok(())
            })
            .unwrap_or_else(|| Err(RepositoryError::NotFound(id.clone())))
    }

    fn list(&self, filter: &DeviceFilter) -> Vec<LicenseStatus> {
        let mut all = self.0.list();
        all.sort_by(|a, b| a.license_ref.cmp(&b.license_ref));
        filter.apply(&all)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryEvents(Store<Vec<TransactionEvent>>);

impl EventRepository for InMemoryEvents {
    fn append(&self, event: TransactionEvent) {
        let id = event.license_status_fk.clone();
        self.0.upsert(&id, Vec::new, |events| events.push(event));
    }

    fn list_for(&self, license_ref: &str) -> Vec<TransactionEvent> {
        self.0.get(license_ref).unwrap_or_default()
    }
}

// -- Per-License Locks --------------------------------------------------------

/// Async locks keyed by license id.
///
/// A status transition holds its license's lock from the read of the
/// record, across the issuer call, until the record and event are
/// committed. Idle locks are dropped once the map grows.
#[derive(Debug, Clone, Default)]
pub struct LicenseLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LicenseLocks {
    const PRUNE_THRESHOLD: usize = 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `license_ref`.
    pub async fn acquire(&self, license_ref: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock();
            if map.len() >= Self::PRUNE_THRESHOLD {
                // Only the map holds an idle lock.
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(map.entry(license_ref.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -- Service States -----------------------------------------------------------

/// State of the issuer (`lcpserver`).
#[derive(Clone)]
pub struct IssuerState {
    pub contents: Arc<dyn ContentRepository>,
    pub licenses: Arc<dyn LicenseRepository>,
    pub builder: Arc<LicenseBuilder>,
    /// Announces new licenses to the status service.
    pub notifier: Option<StatusNotifier>,
}

impl std::fmt::Debug for IssuerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerState")
            .field("builder", &self.builder)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl IssuerState {
    /// Issuer state with empty in-memory repositories.
    pub fn new(builder: LicenseBuilder, notifier: Option<StatusNotifier>) -> Self {
        Self {
            contents: Arc::new(InMemoryContents::default()),
            licenses: Arc::new(InMemoryLicenses::default()),
            builder: Arc::new(builder),
            notifier,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let signer = Arc::new(LicenseSigner::new(config.certificate.load_key()?));
        let builder = LicenseBuilder::new(config.builder_config(), signer);
        let sync = Synchronizer::new(config.sync_config()?)?;
        Ok(Self::new(builder, sync.notifier().cloned()))
    }
}

/// State of the status service (`lsdserver`).
#[derive(Clone)]
pub struct StatusState {
    pub statuses: Arc<dyn StatusRepository>,
    pub events: Arc<dyn EventRepository>,
    pub policy: StatusPolicy,
    pub links: LinkConfig,
    pub localizer: Localizer,
    pub sync: Synchronizer,
    pub locks: LicenseLocks,
    /// `Some` when compliance mode is on.
    pub compliance: Option<ComplianceSession>,
}

impl std::fmt::Debug for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusState")
            .field("policy", &self.policy)
            .field("links", &self.links)
            .field("compliance", &self.compliance.is_some())
            .finish_non_exhaustive()
    }
}

impl StatusState {
    /// Status state with empty in-memory repositories.
    pub fn new(
        policy: StatusPolicy,
        links: LinkConfig,
        localizer: Localizer,
        sync: Synchronizer,
    ) -> Self {
        Self {
            statuses: Arc::new(InMemoryStatuses::default()),
            events: Arc::new(InMemoryEvents::default()),
            policy,
            links,
            localizer,
            sync,
            locks: LicenseLocks::new(),
            compliance: None,
        }
    }

    pub fn with_compliance(mut self, enabled: bool) -> Self {
        self.compliance = enabled.then(ComplianceSession::new);
        self
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let sync = Synchronizer::new(config.sync_config()?)?;
        Ok(Self::new(
            config.license_status,
            config.link_config(),
            Localizer::from_config(&config.localization),
            sync,
        )
        .with_compliance(config.compliance.enabled))
    }

    /// Log a status operation to the compliance session, when one runs.
    pub fn record_compliance(&self, operation: &str, success: bool) {
        if let Some(session) = &self.compliance {
            session.record(operation, success);
        }
    }
}
